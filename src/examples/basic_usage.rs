//! Basic Usage Example
//!
//! Creates an index, uploads a few documents, searches and looks one up.
//!
//! Run with:
//!   AZSEARCH_SERVICE=... AZSEARCH_API_KEY=... cargo run --example basic_usage

use azsearch_rs::*;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service = std::env::var("AZSEARCH_SERVICE")?;
    let api_key = std::env::var("AZSEARCH_API_KEY")?;

    let client = SearchIndexClient::new(service, "hotels-example", api_key)?;

    if !client.index_exists().await? {
        let definition = IndexDefinition::new()
            .field(IndexField::new("hotelId", "Edm.String")?.key(true)?)
            .field(
                IndexField::new("name", "Edm.String")?
                    .searchable(true)
                    .sortable(true),
            )
            .field(
                IndexField::new("category", "Edm.String")?
                    .filterable(true)
                    .facetable(true),
            )
            .field(IndexField::new("rating", "Edm.Int32")?.filterable(true).sortable(true))
            .suggester(Suggester::new("sg", ["name"]));

        client.create(&definition).await?;
        println!("✅ Index created\n");
    }

    let hotels = json!([
        {"hotelId": "1", "name": "Fancy Stay", "category": "Luxury", "rating": 5},
        {"hotelId": "2", "name": "Roach Motel", "category": "Budget", "rating": 1},
        {"hotelId": "3", "name": "Old Century Hotel", "category": "Budget", "rating": 4}
    ]);

    let operations: Vec<IndexBatchOperation> = hotels
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|h| h.as_object().cloned())
        .map(IndexBatchOperation::upload)
        .collect();

    client.batch_insert(&operations).await?;
    println!("📝 Uploaded {} documents\n", operations.len());

    let options = SearchOptions::new()
        .include_count(true)
        .filter("rating ge 4")
        .facets(["category"])
        .highlight("name")
        .highlight_pre_tag("<b>")?
        .highlight_post_tag("</b>")?
        .top(10);

    match client.search("hotel", &options).await {
        Ok(results) => println!("🔍 Results:\n{}\n", serde_json::to_string_pretty(&results)?),
        Err(e) if e.is_retriable() => println!("Service busy, try again later: {}", e),
        Err(e) => return Err(e.into()),
    }

    let doc = client.lookup("1").await?;
    println!("📄 Document 1: {}", serde_json::Value::Object(doc));

    client
        .batch_insert(&[IndexBatchOperation::delete("hotelId", "2")])
        .await?;

    Ok(())
}

use secrecy::SecretString;
use waqi::{obtain_feed, obtain_feed_json, FeedEnvelope, FeedParameters};

#[tokio::main]
async fn main() {
    let client = reqwest::Client::new();

    let token = std::env::var("AQI_API_KEY").unwrap_or_else(|_| "demo".to_owned());
    let parameters = &FeedParameters::builder()
        .station("shanghai")
        .token(SecretString::new(token))
        .build();

    println!("parameters: {:?}", parameters);
    let feed_json: String = obtain_feed_json(&client, parameters).await.unwrap();
    println!("{}", feed_json);
    let feed: FeedEnvelope = obtain_feed(&client, parameters).await.unwrap();
    println!("{:#?}", feed.station_data().unwrap())
}

use anyhow::Result;
use common::gemini::{GenerateContentRequest, Part};
use common::{with_retry, GeminiClient, GenerativeModel, RetryConfig};
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    println!("🤖 Basic Gemini Example");
    println!("=======================\n");

    let client = GeminiClient::from_env()?;
    let request = GenerateContentRequest::user(vec![Part::text(
        "In two sentences, what does a MACD histogram show?",
    )]);

    let response = with_retry(&RetryConfig::default(), "gemini_basic", || {
        client.generate_content(&request)
    })
    .await?;

    println!("Response: {}", response.text().unwrap_or_default());

    Ok(())
}

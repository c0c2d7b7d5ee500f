//! Streamer demo - consume a streaming structured generation in the console
//!
//! The predictor yields raw deltas while the model generates, then the
//! structured field-sets, then the final prediction. This demo prints delta
//! text as it arrives and pretty-prints the final prediction at the end.
//!
//! Run with: cargo run --example streamer

use futures::stream::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use trickle::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Set up logging
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let signature = Signature::new("Answer the question.")
        .input("q", "the question to answer")
        .output(FieldSpec::text("a", "the answer"));

    let gateway = Arc::new(OllamaGateway::new());
    let predictor = Predictor::new("qwen3:32b", gateway, signature);

    let mut inputs = HashMap::new();
    inputs.insert("q".to_string(), "Why did a chicken cross the kitchen?".to_string());

    let mut stream = predictor.stream(&inputs)?;
    let mut final_prediction = None;

    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::Delta(delta) => {
                if let Some(text) = delta.content {
                    print!("{}", text);
                }
            }
            StreamChunk::Prediction(prediction) => final_prediction = Some(prediction),
            other => println!("{:?}", other),
        }
    }

    println!();
    if let Some(prediction) = final_prediction {
        println!("{}", serde_json::to_string_pretty(&prediction.to_json())?);
    }

    Ok(())
}

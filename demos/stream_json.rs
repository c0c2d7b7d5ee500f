//! Web demo - stream a structured problem-statement validation to the browser
//!
//! Starts the HTTP surface with a pharma problem-validator signature bound
//! to it. POST a problem statement to /ask, then open the returned
//! stream_url (the page at / does both and renders every frame).
//!
//! Run with: cargo run --example stream_json

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trickle::prelude::*;

const CONTEXT: &str = "You are a problem evaluator. Evaluate the given problem \
statement against the key factors for the pharma industry: relevance, personas \
mentioned, urgency, and the current process described.";

fn validator_signature() -> Signature {
    Signature::new(
        "Analyze a pharma problem statement and validate it against key factors. \
         Output is a JSON-like dictionary structure.",
    )
    .input("context", "facts here are assumed to be true")
    .input("question", "the problem statement to validate")
    .group(
        "relevance",
        "does the problem statement relate to the pharma industry",
        vec![
            FieldSpec::bool(
                "is_it_relevant",
                "is the problem statement relevant to the pharma industry",
            ),
            FieldSpec::text(
                "justification",
                "justify why it's relevant or why it's not relevant",
            ),
        ],
    )
    .group(
        "personas_validation",
        "validate if personas are mentioned in the problem statement",
        vec![
            FieldSpec::bool(
                "is_personas_mentioned",
                "does the problem statement mention any personas from the pharma industry",
            ),
            FieldSpec::optional_text_list(
                "mentioned_personas",
                "list the mentioned personas if any, otherwise leave empty",
            ),
            FieldSpec::text(
                "personas_validation_output",
                "explain which personas are mentioned and their impact, or why naming them matters",
            ),
        ],
    )
    .group(
        "urgency_validation",
        "classify and validate the urgency of the problem",
        vec![
            FieldSpec::optional_text(
                "urgency_level",
                "classify the urgency as Low, Medium, or High; null when it cannot be determined",
            ),
            FieldSpec::text(
                "urgency_validation_output",
                "explain the urgency level and its impact on pharma operations",
            ),
        ],
    )
    .group(
        "current_process_validation",
        "verify and describe the current process mentioned in the problem",
        vec![
            FieldSpec::bool(
                "is_process_mentioned",
                "does the problem statement describe the current process",
            ),
            FieldSpec::optional_text(
                "current_process_description",
                "describe the current process as mentioned; null when none is described",
            ),
            FieldSpec::text(
                "process_validation_output",
                "explain the current process and its limitations, or why describing it is important",
            ),
        ],
    )
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "trickle=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = Arc::new(OllamaGateway::new());
    let predictor = Predictor::new("qwen3:32b", gateway, validator_signature());

    let state = Arc::new(AppState::new(predictor, "question").with_input("context", CONTEXT));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    println!("Open http://{addr}/ and ask away");
    trickle::server::serve(addr, state).await?;

    Ok(())
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use outfit_runner::category::{category_of, CategoryUsage, OutfitCategory};
use outfit_runner::llm::{LlmRequest, LlmResponse};
use outfit_runner::prompt::WARDROBE_HEADING;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const IMPOSED_HEADING: &str = "## Imposed items (mandatory)";
const MALFORMED: &str = r#"{"invalid": "json", missing_fields: true}"#;

#[derive(Clone)]
struct AppState {
    attempt_count: Arc<AtomicUsize>,
    fail_attempts: usize,
}

/// `(id, type label)` of every item listed under `heading`.
fn listed_items(system: &str, heading: &str) -> Vec<(i64, String)> {
    let mut in_section = false;
    let mut current_label: Option<String> = None;
    let mut items = Vec::new();

    for line in system.lines() {
        if line.starts_with("## ") {
            in_section = line == heading;
            current_label = None;
            continue;
        }
        if !in_section {
            continue;
        }

        if let Some(header) = line.strip_prefix("### ") {
            current_label = header.rsplit_once(" (").map(|(label, _)| label.to_string());
            continue;
        }

        let Some(rest) = line.strip_prefix("- [ID ") else {
            continue;
        };
        let Some((id, tail)) = rest.split_once(']') else {
            continue;
        };
        let Ok(id) = id.parse::<i64>() else {
            continue;
        };
        // Imposed items carry their type inline: "[ID n]: name (type) | ..."
        let label = current_label.clone().or_else(|| {
            let start = tail.rfind(" (")? + 2;
            let end = tail[start..].find(')')? + start;
            Some(tail[start..end].to_string())
        });
        if let Some(label) = label {
            items.push((id, label));
        }
    }

    items
}

/// Build a structurally valid look from the prompt's wardrobe listing.
fn propose(system: &str) -> serde_json::Value {
    let wardrobe = listed_items(system, WARDROBE_HEADING);
    let imposed = listed_items(system, IMPOSED_HEADING);

    let mut usage = CategoryUsage::default();
    let mut items = Vec::new();
    for (id, label) in &imposed {
        usage = usage.with_type(label);
        items.push(json!({"idItem": id, "reason": "requested by the user"}));
    }

    let first = |category: OutfitCategory| {
        wardrobe
            .iter()
            .find(|(_, label)| category_of(label) == Some(category))
            .map(|(id, _)| *id)
    };
    let has = |category: OutfitCategory| first(category).is_some();

    let two_piece_possible =
        usage.top || usage.bottom || (has(OutfitCategory::Top) && has(OutfitCategory::Bottom));
    let wanted: &[OutfitCategory] = if usage.dress || !two_piece_possible {
        &[OutfitCategory::Dress, OutfitCategory::Shoes]
    } else {
        &[OutfitCategory::Top, OutfitCategory::Bottom, OutfitCategory::Shoes]
    };

    for category in wanted {
        if usage.is_taken(*category) {
            continue;
        }
        if let Some(id) = first(*category) {
            usage.mark(*category);
            let reason = format!("{category} picked by the mock model");
            items.push(json!({"idItem": id, "reason": reason}));
        }
    }

    json!({
        "items": items,
        "generalReasoning": "Mock outfit: first matching item of each needed category."
    })
}

async fn llm(State(state): State<AppState>, Json(req): Json<LlmRequest>) -> Json<LlmResponse> {
    let attempt = state.attempt_count.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::info!(attempt, temperature = req.temperature, "Mock LLM received request");

    // Fail first N attempts to exercise the runner's retries.
    let output = if attempt <= state.fail_attempts {
        tracing::info!(attempt, "Returning malformed JSON");
        MALFORMED.to_string()
    } else {
        propose(&req.system).to_string()
    };

    Json(LlmResponse { output })
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_llm_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("MOCK_LLM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8081);

    let fail_attempts = std::env::var("MOCK_LLM_FAIL_ATTEMPTS")
        .ok()
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(1);

    let state = AppState {
        attempt_count: Arc::new(AtomicUsize::new(0)),
        fail_attempts,
    };

    let app = Router::new()
        .route("/llm", post(llm))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, fail_attempts, "Mock LLM server listening, POST /llm");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM: &str = "intro\n\
        ## Available wardrobe\n\
        ### Shoes (1 options)\n\
        - [ID 9]: Loafers | color: brown | season: all | formality: casual\n\
        ### Shirts (1 options)\n\
        - [ID 1]: Oxford | color: white | season: all | formality: casual\n\
        ### Trousers (1 options)\n\
        - [ID 2]: Chinos | color: beige | season: all | formality: casual\n\
        ### Dresses (1 options)\n\
        - [ID 5]: Slip dress | color: green | season: summer | formality: formal\n\
        \n\
        ## Response format\n";

    fn ids(value: &serde_json::Value) -> Vec<i64> {
        value["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["idItem"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn parses_wardrobe_listing() {
        let items = listed_items(SYSTEM, WARDROBE_HEADING);
        assert_eq!(items[0], (9, "Shoes".to_string()));
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn proposes_two_piece_outfit_by_default() {
        assert_eq!(ids(&propose(SYSTEM)), vec![1, 2, 9]);
    }

    #[test]
    fn imposed_dress_switches_to_dress_outfit() {
        let system = SYSTEM.replace(
            "## Response format\n",
            "## Imposed items (mandatory)\n\
             The user asked for these items:\n\
             - [ID 5]: Slip dress (Dresses) | color: green\n\
             ## Response format\n",
        );
        assert_eq!(ids(&propose(&system)), vec![5, 9]);
    }
}

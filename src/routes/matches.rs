use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{matched_candidate_ids, overlap_score};
use crate::models::{
    CandidateProfile, ErrorResponse, HealthResponse, KeywordsRequest, KeywordsResponse, MatchRequest,
    MatchResponse, MatchedCandidate, PriceRequest, PriceResponse, PriceSource,
};
use crate::services::ArtifactStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub artifacts: Arc<ArtifactStore>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/requests/match", web::post().to(match_request))
        .route("/keywords", web::post().to(extract_keywords))
        .route("/price", web::post().to(estimate_price));
}

fn artifacts_unavailable(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: "Artifacts unavailable".to_string(),
        message: e.to_string(),
        status_code: 503,
    })
}

fn validation_failed(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: e.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.artifacts.is_loaded() { "healthy" } else { "starting" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Match and price a request
///
/// POST /api/v1/requests/match
///
/// Request body:
/// ```json
/// {
///   "text": "string",
///   "category": "string",
///   "candidates": [{"id": 1, "categories": "math,physics", "solvedKeywords": "calculus"}],
///   "topK": 5
/// }
/// ```
async fn match_request(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return validation_failed(errors);
    }

    let engine = match state.artifacts.engine().await {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to load matching artifacts: {}", e);
            return artifacts_unavailable(e);
        }
    };

    let req = req.into_inner();
    let matching = state.artifacts.matching();
    let top_k = req.top_k.unwrap_or(matching.top_k).min(matching.max_top_k);

    let mut candidates: Vec<CandidateProfile> = Vec::with_capacity(req.candidates.len());
    for record in req.candidates {
        let id = record.id;
        match CandidateProfile::try_from(record) {
            Ok(profile) => candidates.push(profile),
            Err(e) => tracing::warn!("Skipping candidate {}: {}", id, e),
        }
    }

    let text = req.text.as_deref();
    let category = req.category.as_deref();

    let keywords = engine.keywords(text.unwrap_or(""), matching.keyword_top_k);
    let price = engine.pricing.estimate(text, category);
    let result = engine.matcher.find_matches(text, category, &candidates, top_k);
    let matched_ids = matched_candidate_ids(&result.matches, category.unwrap_or(""), &candidates);

    let scores: HashMap<i64, f64> = result
        .matches
        .iter()
        .map(|m| (m.candidate_id, m.score))
        .collect();
    let by_id: HashMap<i64, &CandidateProfile> = candidates.iter().map(|c| (c.id, c)).collect();
    let matched = matched_ids
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|c| MatchedCandidate {
            id: c.id,
            categories: c.categories.as_slice().to_vec(),
            score: match scores.get(&c.id) {
                Some(score) => score / 100.0,
                None => overlap_score(c, &keywords),
            },
        })
        .collect();

    tracing::info!(
        "Returning {} matches (from {} candidates), price {}",
        result.matches.len(),
        result.total_candidates,
        price
    );

    HttpResponse::Ok().json(MatchResponse {
        keywords,
        price,
        matches: result.matches,
        matched_ids,
        matched,
        total_candidates: result.total_candidates,
    })
}

/// Extract keywords
///
/// POST /api/v1/keywords
async fn extract_keywords(
    state: web::Data<AppState>,
    req: web::Json<KeywordsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    match state.artifacts.engine().await {
        Ok(engine) => HttpResponse::Ok().json(KeywordsResponse {
            keywords: engine.keywords(req.text.as_deref().unwrap_or(""), req.top_k),
        }),
        Err(e) => {
            tracing::error!("Failed to load matching artifacts: {}", e);
            artifacts_unavailable(e)
        }
    }
}

/// Estimate a price
///
/// POST /api/v1/price
async fn estimate_price(
    state: web::Data<AppState>,
    req: web::Json<PriceRequest>,
) -> impl Responder {
    match state.artifacts.engine().await {
        Ok(engine) => {
            let source = if engine.pricing.has_model() {
                PriceSource::Model
            } else {
                PriceSource::Heuristic
            };
            HttpResponse::Ok().json(PriceResponse {
                price: engine
                    .pricing
                    .estimate(req.text.as_deref(), req.category.as_deref()),
                source,
            })
        }
        Err(e) => {
            tracing::error!("Failed to load matching artifacts: {}", e);
            artifacts_unavailable(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingSettings;
    use crate::core::{PriceEstimator, VocabularyStore};
    use crate::models::ScoringWeights;
    use crate::services::MatchEngine;
    use actix_web::{test, App};

    fn state() -> AppState {
        state_with(MatchingSettings::default())
    }

    fn state_with(matching: MatchingSettings) -> AppState {
        let vocab = VocabularyStore::new(vec![("math", vec!["calculus".to_string(), "integrals".to_string()])]);
        let engine = MatchEngine::new(vocab, PriceEstimator::heuristic(), &matching, ScoringWeights::default());
        AppState {
            artifacts: Arc::new(ArtifactStore::preloaded(engine, matching)),
        }
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "healthy");
    }

    #[actix_web::test]
    async fn test_match_endpoint() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let body = serde_json::json!({
            "text": "calculus integral problem",
            "category": "math",
            "candidates": [
                {"id": 1, "categories": "physics", "solvedKeywords": "optics"},
                {"id": 2, "categories": "math", "solvedKeywords": ""},
                {"id": 3, "role": "student", "categories": "math"}
            ]
        });
        let req = test::TestRequest::post().uri("/requests/match").set_json(&body).to_request();
        let resp: MatchResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.total_candidates, 2);
        assert_eq!(resp.matches[0].candidate_id, 2);
        assert!(resp.matches[0].score >= 12.0);
        assert_eq!(resp.matched_ids[0], 2);
        assert_eq!(resp.price, 26.0);
        assert!(resp.keywords.contains(&"calculus".to_string()));
        assert!(resp.matched.iter().all(|m| (0.0..=1.0).contains(&m.score)));
    }

    #[actix_web::test]
    async fn test_match_endpoint_uses_configured_top_k() {
        let matching = MatchingSettings { top_k: 2, max_top_k: 3, ..MatchingSettings::default() };
        let app = test::init_service(
            App::new().app_data(web::Data::new(state_with(matching))).configure(configure),
        )
        .await;
        let candidates: Vec<serde_json::Value> = (1..=6)
            .map(|id| serde_json::json!({"id": id, "categories": "math", "solvedKeywords": "calculus"}))
            .collect();

        let req = test::TestRequest::post()
            .uri("/requests/match")
            .set_json(serde_json::json!({"text": "calculus", "category": "math", "candidates": candidates}))
            .to_request();
        let resp: MatchResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.matches.len(), 2);

        let req = test::TestRequest::post()
            .uri("/requests/match")
            .set_json(serde_json::json!({"text": "calculus", "candidates": candidates, "topK": 10}))
            .to_request();
        let resp: MatchResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.matches.len(), 3);
    }

    #[actix_web::test]
    async fn test_match_endpoint_rejects_bad_top_k() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/requests/match")
            .set_json(serde_json::json!({"text": "x", "topK": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_price_and_keywords_on_empty_input() {
        let app = test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await;

        let req = test::TestRequest::post().uri("/price").set_json(serde_json::json!({})).to_request();
        let resp: PriceResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.price, 20.0);
        assert_eq!(resp.source, PriceSource::Heuristic);

        let req = test::TestRequest::post()
            .uri("/keywords")
            .set_json(serde_json::json!({"text": ""}))
            .to_request();
        let resp: KeywordsResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.keywords.is_empty());
    }
}

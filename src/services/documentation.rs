use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Agora Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
        crate::routes::debate::get_debate,
        crate::routes::debate::submit_argument,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::ArgumentSnapshot,
            crate::dto::ws::ScorePair,
            crate::dto::debate::TopicSummary,
            crate::dto::debate::SubmitArgumentRequest,
            crate::dto::debate::ArgumentSummary,
            crate::dto::debate::DebateDetail,
            crate::state::debate::Side,
            crate::state::debate::DebateStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "debates", description = "Debate reads and argument submission"),
        (name = "realtime", description = "WebSocket operations for matchmaking and debate updates"),
    )
)]
pub struct ApiDoc;

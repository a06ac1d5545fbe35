/// Argument submission and debate reads.
pub mod debate_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Verdict workflow for debates that exhausted their rounds.
pub mod judgment;
/// FIFO queue management and pairing.
pub mod matchmaking;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
/// WebSocket event construction and fan-out.
pub mod ws_events;

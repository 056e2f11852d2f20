//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, warn};

use super::responses::{
    ApiResponse, CycleCountRequest, FocusDurationRequest, HealthResponse, StatusResponse,
};
use crate::{
    bridge::{Broadcast, Command},
    state::{AppState, TaskContext},
};

async fn send_command(
    state: &AppState,
    command: Command,
) -> Result<Json<ApiResponse>, StatusCode> {
    let name = command.name();
    match state.dispatch(command).await {
        Ok((delivery, timer)) => Ok(Json(ApiResponse::for_delivery(name, delivery, timer))),
        Err(e) => {
            error!("Failed to dispatch {}: {}", name, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/start - optional JSON body names the task being worked on
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    task: Option<Json<TaskContext>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let task = task.map(|Json(task)| task);
    send_command(&state, Command::StartTimer { task }).await
}

/// Handle POST /timer/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::PauseTimer).await
}

/// Handle POST /timer/resume
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::ResumeTimer).await
}

/// Handle POST /timer/stop
pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::StopTimer).await
}

/// Handle POST /timer/skip-break
pub async fn skip_break_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::SkipBreak).await
}

/// Handle POST /timer/skip-cycle - end the current phase now
pub async fn skip_cycle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::SkipCycle).await
}

/// Handle POST /timer/sync
pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, Command::SyncState).await
}

/// Handle POST /timer/focus-duration
pub async fn focus_duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FocusDurationRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if request.minutes == 0 {
        warn!("Rejecting zero-minute focus duration");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    send_command(
        &state,
        Command::SetFocusDuration {
            minutes: request.minutes,
        },
    )
    .await
}

/// Handle POST /timer/cycle-count
pub async fn cycle_count_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CycleCountRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(
        &state,
        Command::SetCycleCount {
            count: request.count,
        },
    )
    .await
}

/// Handle POST /command - any protocol command as tagged JSON
pub async fn command_handler(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<Json<ApiResponse>, StatusCode> {
    send_command(&state, command).await
}

/// Handle GET /status - Return the rendered timer view and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.current_view(),
        authority_attached: state.bridge.is_attached(),
        queued_commands: state.bridge.pending_len(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /events - Server-sent stream of every broadcast
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let client = state.bridge.connect().map_err(|e| {
        error!("Failed to connect event stream: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let events = stream::unfold(client, |mut client| async move {
        let broadcast = client.recv().await?;
        Some((Ok(to_sse_event(&broadcast)), client))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(broadcast: &Broadcast) -> Event {
    let name = match broadcast {
        Broadcast::TimerState(_) => "TIMER_STATE",
        Broadcast::CycleEnd { .. } => "CYCLE_END",
    };
    match Event::default().event(name).json_data(broadcast) {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to encode {} event: {}", name, e);
            Event::default().comment("encoding failed")
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

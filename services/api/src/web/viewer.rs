//! services/api/src/web/viewer.rs
//!
//! The WebSocket control loop for an open document. Each connection owns one
//! `ViewerSession`; client gestures and navigation flow in, layout and page
//! events flow back out, and reading progress is persisted through the
//! debounced writer as the user reads.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use shelf_core::{
    notes::NotesService,
    viewer::{ProgressWriter, ViewerEvent, ViewerSession},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::{
    protocol::{ClientMessage, NotePayload, ServerMessage},
    state::{AppState, AuthEvent},
    tickets::TicketKind,
};

/// Shown once when immersive mode is entered.
const IMMERSIVE_HINT: &str = "Long press to show controls";

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn viewer_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("Viewer connection established for user: {}", user_id);

    let (mut sender, mut receiver) = socket.split();

    // --- 1. Initialization Phase ---
    let pdf_id = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(&init_json) {
                Ok(ClientMessage::Init { pdf_id }) => pdf_id,
                _ => {
                    error!("First message was not a valid Init message.");
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    let pdf = match app_state.db.get_pdf_by_id(pdf_id).await {
        Ok(pdf) => pdf,
        Err(e) => {
            error!("Failed to load document {}: {:?}", pdf_id, e);
            let _ = send_message(
                &mut sender,
                &ServerMessage::Error {
                    message: "Failed to load document.".to_string(),
                },
            )
            .await;
            return;
        }
    };

    // A missing progress row just means the document opens at page one.
    let starting_page = match app_state.db.get_reading_progress(user_id, pdf_id).await {
        Ok(progress) => progress.map(|p| p.current_page).unwrap_or(1),
        Err(e) => {
            warn!("Failed to load reading progress for {}: {:?}", pdf_id, e);
            1
        }
    };

    let mut session = ViewerSession::new(starting_page);
    let progress = ProgressWriter::new(app_state.db.clone(), user_id, pdf_id);
    let notes = NotesService::new(app_state.db.clone());

    // The file link is a short-lived ticket; the PDF itself is fetched over
    // plain HTTP so the browser's PDF pipeline can stream it.
    let file_token = app_state
        .tickets
        .issue(&pdf.file_path, TicketKind::Read, app_state.config.signed_url_ttl)
        .await;
    let ready = ServerMessage::SessionReady {
        pdf_id,
        file_url: format!("/library/file/{}", file_token),
        page: session.page(),
        scale: session.scale(),
    };
    if send_message(&mut sender, &ready).await.is_err() {
        error!("Failed to send session ready message.");
        return;
    }

    let mut auth_rx = app_state.auth_events.subscribe();

    // --- 2. Main Message Loop ---
    loop {
        let deadline = session.next_deadline().map(tokio::time::Instant::from_std);
        tokio::select! {
            incoming = receiver.next() => {
                let events = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_message(&text, &mut session)
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client sent close message.");
                        break;
                    }
                    Some(Ok(_)) => Vec::new(),
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                    None => {
                        info!("Client disconnected.");
                        break;
                    }
                };
                if dispatch_events(events, &mut sender, &progress, &notes, pdf_id).await.is_err() {
                    break;
                }
            }
            // Fires when a held press matures or an auto-hide timer lapses.
            _ = sleep_until(deadline) => {
                let events = session.poll(Instant::now());
                if dispatch_events(events, &mut sender, &progress, &notes, pdf_id).await.is_err() {
                    break;
                }
            }
            event = auth_rx.recv() => {
                match event {
                    Ok(AuthEvent::SignedOut { user_id: signed_out }) if signed_out == user_id => {
                        info!("User {} signed out; closing viewer connection.", user_id);
                        let _ = send_message(
                            &mut sender,
                            &ServerMessage::Error { message: "Signed out.".to_string() },
                        )
                        .await;
                        break;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Viewer missed {} auth events.", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // --- 3. Cleanup ---
    progress.flush().await;
    info!("Viewer connection closed for user: {}", user_id);
}

/// Parses a text frame and feeds it to the session. Anything malformed is
/// logged and dropped; the connection stays up.
fn handle_text_message(text: &str, session: &mut ViewerSession) -> Vec<ViewerEvent> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Init { .. }) => {
            warn!("Received subsequent Init message, which is ignored.");
            Vec::new()
        }
        Ok(client_msg) => match client_msg.into_viewer_input() {
            Some(input) => session.handle(input, Instant::now()),
            None => Vec::new(),
        },
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            Vec::new()
        }
    }
}

/// Turns session events into outbound frames and side effects. A send error
/// means the socket is gone and the caller should stop the loop.
async fn dispatch_events(
    events: Vec<ViewerEvent>,
    sender: &mut SplitSink<WebSocket, Message>,
    progress: &ProgressWriter,
    notes: &NotesService,
    pdf_id: Uuid,
) -> Result<(), axum::Error> {
    for event in events {
        match event {
            ViewerEvent::PageChanged {
                page,
                total_pages,
                percent,
            } => {
                send_message(
                    sender,
                    &ServerMessage::PageChanged {
                        page,
                        total_pages,
                        percent,
                    },
                )
                .await?;
            }
            ViewerEvent::ProgressDirty { page, total_pages } => {
                progress.record(page, total_pages).await;
            }
            ViewerEvent::NotesInvalidated { page } => {
                match notes.list_for_page(pdf_id, page).await {
                    Ok(page_notes) => {
                        send_message(
                            sender,
                            &ServerMessage::NotesRefreshed {
                                page,
                                notes: page_notes.into_iter().map(NotePayload::from).collect(),
                            },
                        )
                        .await?;
                    }
                    Err(e) => {
                        warn!("Failed to load notes for page {}: {:?}", page, e);
                    }
                }
            }
            ViewerEvent::ScaleChanged { scale } => {
                send_message(sender, &ServerMessage::ScaleChanged { scale }).await?;
            }
            ViewerEvent::LayoutChanged { page_width } => {
                send_message(sender, &ServerMessage::LayoutChanged { page_width }).await?;
            }
            ViewerEvent::ControlsChanged { visible } => {
                send_message(sender, &ServerMessage::ControlsChanged { visible }).await?;
            }
            ViewerEvent::ImmersiveChanged { active } => {
                send_message(sender, &ServerMessage::ImmersiveChanged { active }).await?;
            }
            ViewerEvent::HintShown => {
                send_message(
                    sender,
                    &ServerMessage::HintShown {
                        message: IMMERSIVE_HINT.to_string(),
                    },
                )
                .await?;
            }
            ViewerEvent::HintDismissed => {
                send_message(sender, &ServerMessage::HintDismissed).await?;
            }
            ViewerEvent::FullscreenRequested { enter } => {
                send_message(sender, &ServerMessage::FullscreenRequest { enter }).await?;
            }
            ViewerEvent::LoadFailed { message } => {
                send_message(sender, &ServerMessage::LoadFailed { message }).await?;
            }
        }
    }
    Ok(())
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).unwrap();
    sender.send(Message::Text(json.into())).await
}

/// Pends forever when the session has no armed timer, so the select loop
/// only wakes for socket traffic.
async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

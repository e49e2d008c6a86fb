//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the PDF viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::domain::Note;
use shelf_core::viewer::ViewerInput;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a viewer on one document. This must be the first message sent
    /// on the connection.
    Init { pdf_id: Uuid },

    /// The renderer finished loading the document and knows its page count.
    DocumentLoaded { total_pages: u32 },

    /// The renderer failed to load or draw the document.
    DocumentFailed { message: String },

    /// The window and viewing-surface widths, sent on open and on resize.
    Viewport {
        window_width: f32,
        container_width: f32,
    },

    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },

    NextPage,
    PreviousPage,
    JumpToPage { page: u32 },

    ZoomIn,
    ZoomOut,
    ResetZoom,

    ToggleFullscreen,
    /// The platform granted or revoked fullscreen.
    FullscreenChanged { active: bool },

    EnterImmersive,
    ExitImmersive,

    OpenNotes,
    CloseNotes,
}

impl ClientMessage {
    /// Maps a wire message onto a viewer input. `Init` is handled by the
    /// connection setup, not the session, and maps to `None`.
    pub fn into_viewer_input(self) -> Option<ViewerInput> {
        match self {
            ClientMessage::Init { .. } => None,
            ClientMessage::DocumentLoaded { total_pages } => {
                Some(ViewerInput::DocumentLoaded { total_pages })
            }
            ClientMessage::DocumentFailed { message } => {
                Some(ViewerInput::DocumentFailed { message })
            }
            ClientMessage::Viewport {
                window_width,
                container_width,
            } => Some(ViewerInput::Viewport {
                window_width,
                container_width,
            }),
            ClientMessage::TouchStart { x, y } => Some(ViewerInput::TouchStart { x, y }),
            ClientMessage::TouchMove { x, y } => Some(ViewerInput::TouchMove { x, y }),
            ClientMessage::TouchEnd { x, y } => Some(ViewerInput::TouchEnd { x, y }),
            ClientMessage::NextPage => Some(ViewerInput::NextPage),
            ClientMessage::PreviousPage => Some(ViewerInput::PreviousPage),
            ClientMessage::JumpToPage { page } => Some(ViewerInput::JumpToPage { page }),
            ClientMessage::ZoomIn => Some(ViewerInput::ZoomIn),
            ClientMessage::ZoomOut => Some(ViewerInput::ZoomOut),
            ClientMessage::ResetZoom => Some(ViewerInput::ResetZoom),
            ClientMessage::ToggleFullscreen => Some(ViewerInput::ToggleFullscreen),
            ClientMessage::FullscreenChanged { active } => {
                Some(ViewerInput::FullscreenChanged { active })
            }
            ClientMessage::EnterImmersive => Some(ViewerInput::EnterImmersive),
            ClientMessage::ExitImmersive => Some(ViewerInput::ExitImmersive),
            ClientMessage::OpenNotes => Some(ViewerInput::OpenNotes),
            ClientMessage::CloseNotes => Some(ViewerInput::CloseNotes),
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful viewer initialization. `file_url` is a
    /// short-lived ticket URL the renderer fetches the document from.
    SessionReady {
        pdf_id: Uuid,
        file_url: String,
        page: u32,
        scale: f32,
    },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },

    PageChanged {
        page: u32,
        total_pages: u32,
        percent: f32,
    },

    ScaleChanged { scale: f32 },

    /// `page_width: None` means the desktop zoom scale applies instead.
    LayoutChanged { page_width: Option<f32> },

    ControlsChanged { visible: bool },

    ImmersiveChanged { active: bool },

    HintShown { message: String },
    HintDismissed,

    /// Asks the client to enter or leave platform fullscreen.
    FullscreenRequest { enter: bool },

    LoadFailed { message: String },

    /// The notes for the overlay's current page, freshly fetched.
    NotesRefreshed { page: u32, notes: Vec<NotePayload> },
}

/// One note as it crosses the wire. Shared by the viewer socket and the
/// notes REST endpoints.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct NotePayload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub page_number: u32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NotePayload {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            page_number: note.page_number,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

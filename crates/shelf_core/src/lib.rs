pub mod domain;
pub mod notes;
pub mod ports;
pub mod viewer;

#[cfg(test)]
pub mod testutil;

pub use domain::{
    BlogImage, BlogPost, BlogPostPatch, NewBlogImage, NewBlogPost, Note, NoteWithPdf, Pdf, PdfRef,
    PostStatus, QuickRef, QuickRefPatch, ReadingProgress, User, UserCredentials,
};
pub use notes::{NotesError, NotesService};
pub use ports::{DatabaseService, ObjectStorageService, PortError, PortResult};
pub use viewer::{ProgressWriter, ViewerEvent, ViewerInput, ViewerSession};

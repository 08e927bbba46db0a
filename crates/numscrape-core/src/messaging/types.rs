use std::path::PathBuf;

/// Presence indicator shown while a request is being served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    UploadDocument,
}

/// What the transport behind a [`MessagingPort`](super::port::MessagingPort) allows.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Sent messages can be edited in place.
    pub supports_edit: bool,
    /// Longest document caption accepted, in characters.
    pub max_caption_len: usize,
}

/// A local file to upload, with the name the recipient should see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub path: PathBuf,
    pub file_name: String,
}

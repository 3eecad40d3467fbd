// Domain layer: value records and the collaborator ports (inference, transcription, presentation).

pub mod model;
pub mod ports;

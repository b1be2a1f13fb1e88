#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::doc_markdown
)]
pub mod arena;
pub mod camera;
pub mod celestial;
pub mod config;
pub mod error;
pub mod generators;
pub mod input;
pub mod math;
pub mod noise;
pub mod orbit;
pub mod overlay;
pub mod scene;
pub mod sim;
pub mod texture;
pub mod time;

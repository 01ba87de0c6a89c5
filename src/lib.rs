// Retro Canvas Library
// Frame ingestion, conversion and double buffering for rendering console
// video onto a fixed-size, fixed-palette canvas surface

// Public modules
pub mod config;
pub mod display;
pub mod pipeline;
pub mod screenshot;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig};
pub use display::{
    expand_rgb565, CanvasColor, CanvasImage, CanvasPalette, PaletteKind, PixelBuffer,
};
pub use pipeline::{
    ConsumerState, FrameOrigin, FramePipeline, IndexedPixelSink, IndexedProducer,
    PipelineError, PipelineStats, RawFrameSink, RawFrameSubmitter, ReadyFrame,
};
pub use screenshot::{save_canvas_png, save_frame_png, ScreenshotError};

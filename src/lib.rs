pub mod config;
pub mod error;
pub mod io;
pub mod parser;
pub mod pipeline;
pub mod plotting;
pub mod render;
pub mod series;
pub mod trajectory;
pub mod viewport;

pub use error::{Result, VizError};
pub use parser::{parse, LogFormat, LogParser, Observation, TabularData, TimestepRecord};
pub use render::{AnimationRenderer, RenderContext, RenderedFrame};
pub use series::{aggregate, Reducer, ScalarSeries, TimeSeriesAggregator};
pub use trajectory::TrajectoryStore;
pub use viewport::Viewport;

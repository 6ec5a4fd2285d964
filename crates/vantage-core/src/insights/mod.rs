//! Insight orchestration
//!
//! Builds an aggregate [`Digest`] from the analytics reports, renders it
//! into the sales insight prompt and asks the configured AI backend for a
//! narrative, recommendations and a trends analysis.
//!
//! ```rust,ignore
//! let snapshot = Analytics::new(&db, &config).snapshot(window, &region)?;
//! let digest = Digest::collect(Arc::new(snapshot), config.clone()).await?;
//! let generator = InsightGenerator::new(client, config.insights.clone())?;
//! let report = generator.generate_insights(&digest).await?;
//! ```

mod digest;
mod generator;

pub use digest::{CustomerDigest, Digest};
pub use generator::InsightGenerator;

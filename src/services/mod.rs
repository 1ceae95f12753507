pub mod aggregator;
pub mod enrichment;
pub mod providers;
pub mod recommendations;
pub mod resolver;
pub mod scoring;

pub use aggregator::CandidateAggregator;
pub use enrichment::{EnrichmentManager, MetadataProviders};
pub use recommendations::RecommendationService;
pub use resolver::ShowResolver;

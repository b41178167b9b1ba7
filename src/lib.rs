pub mod aggregator;
pub mod gateway;
pub mod output;
pub mod postprocess;
pub mod runtime;

pub use aggregator::planner::{PageIndex, PagePlan};
pub use aggregator::progress::{progress_channel, Progress, ProgressReceiver, ProgressSender};
pub use aggregator::run::OwnersAggregator;
pub use aggregator::slots::{Placement, SlotBoard};
pub use aggregator::throttle::Throttle;
pub use gateway::{CollectionPages, GatewayClient, GatewayClientOptions, GatewayError, PageClient};
pub use output::{write_owners_file, OWNERS_FILE_NAME};
pub use postprocess::{dedup_owners, exclude_contracts, AddressClassifier, BechPrefixClassifier};
pub use runtime::config::{CollectorConfig, CollectorConfigBuilder, CollectorConfigParams};
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};

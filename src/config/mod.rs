pub mod settings;

pub use settings::{
    BitbucketSettings, FetchPolicy, SettingsSource, ENV_API_TOKEN, ENV_DIALECT, ENV_DOMAIN,
    ENV_USERNAME,
};

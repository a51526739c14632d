use crate::cli::output::Output;
use crate::errors::Result;

/// Show version information
pub async fn run() -> Result<()> {
    Output::section("Bitbucket Reporter");
    Output::sub_item(format!("Version: {}", env!("CARGO_PKG_VERSION")));
    Output::sub_item(format!("Description: {}", env!("CARGO_PKG_DESCRIPTION")));

    Output::section("Build Information");
    Output::sub_item(format!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION")));
    Output::sub_item(format!("Target: {}", std::env::consts::ARCH));
    Output::sub_item(format!("OS: {}", std::env::consts::OS));

    #[cfg(debug_assertions)]
    Output::sub_item("Build type: Debug");
    #[cfg(not(debug_assertions))]
    Output::sub_item("Build type: Release");

    Output::section("Environment");
    Output::sub_item("BITBUCKET_DOMAIN: base URL of the Bitbucket instance");
    Output::sub_item("BITBUCKET_API_TOKEN: access token or app password");
    Output::sub_item("BITBUCKET_USERNAME: optional, enables Basic auth");
    Output::sub_item("BITBUCKET_DIALECT: optional, 'cloud' or 'server'");

    Ok(())
}

use miette::Context;
use miette::IntoDiagnostic;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Log human-readable events to `stderr`, keeping `stdout` free for the summary.
pub fn install_tracing(filter_directives: &str) -> miette::Result<()> {
    let human_layer = tracing_human_layer::HumanLayer::new()
        .with_output_writer(std::io::stderr())
        .with_filter(env_filter(filter_directives)?);

    tracing_subscriber::registry()
        .with(human_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install tracing subscriber")
}

fn env_filter(filter_directives: &str) -> miette::Result<EnvFilter> {
    EnvFilter::try_new(filter_directives)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid log filter: {filter_directives:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter() {
        assert!(env_filter("warn").is_ok());
        assert!(env_filter("git_review_branch::builder=debug,info").is_ok());
        assert!(env_filter("git_review_branch=loud").is_err());
    }
}

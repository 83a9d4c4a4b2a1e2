use crate::fetch::SourceFetcher;
use crate::resolve::PublicOnlyResolver;
use crate::url_policy::UrlPolicy;
use pixfeed_core::FilterServiceConfig;
use pixfeed_processing::GrayscaleThumbnail;

pub struct FilterState {
    pub policy: UrlPolicy,
    pub fetcher: SourceFetcher,
    pub filter: GrayscaleThumbnail,
}

impl FilterState {
    pub fn from_config(config: &FilterServiceConfig) -> anyhow::Result<Self> {
        let policy = UrlPolicy::new(config.allow_private_urls, config.url_allowlist.clone());
        let fetcher = if config.allow_private_urls {
            SourceFetcher::new(config.fetch_timeout(), config.max_input_bytes)?
        } else {
            SourceFetcher::public_only(
                config.fetch_timeout(),
                config.max_input_bytes,
                PublicOnlyResolver::default(),
            )?
        };
        let filter = GrayscaleThumbnail::new(config.output_size, config.jpeg_quality)?;

        Ok(Self {
            policy,
            fetcher,
            filter,
        })
    }
}

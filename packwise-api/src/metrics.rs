//! Prometheus counters for packaging answers and scans.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use packwise_catalog::PackagingDescriptor;
use packwise_core::ScannedAs;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    resolutions_total: IntCounterVec,
    scans_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let resolutions_total = IntCounterVec::new(
            Opts::new("packwise_packaging_resolutions_total", "Packaging answers by source"),
            &["source"],
        )?;
        let scans_total = IntCounterVec::new(
            Opts::new("packwise_scans_total", "Product scans by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(resolutions_total.clone()))?;
        registry.register(Box::new(scans_total.clone()))?;

        Ok(Self {
            registry,
            resolutions_total,
            scans_total,
        })
    }

    pub fn record_resolution(&self, packaging: &PackagingDescriptor) {
        let source = packaging.source.map(|s| s.as_str()).unwrap_or("none");
        self.resolutions_total.with_label_values(&[source]).inc();
    }

    /// `None` counts a scan that matched nothing.
    pub fn record_scan(&self, scanned_as: Option<ScannedAs>) {
        let outcome = match scanned_as {
            Some(ScannedAs::Variant) => "variant",
            Some(ScannedAs::Template) => "template",
            Some(ScannedAs::Packaging) => "packaging",
            None => "miss",
        };
        self.scans_total.with_label_values(&[outcome]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

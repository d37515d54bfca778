use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use crate::state::Provenance;
use crate::store::BoundingBox;

use super::error::SourceError;
use super::source::{parse_states_document, IngestionSource, RawBatch};

pub const DEFAULT_OPENSKY_URL: &str = "https://opensky-network.org/api/states/all";

/// Polls the OpenSky `states/all` endpoint.
pub struct OpenSkySource {
    name: String,
    url: String,
    interval: Duration,
    credentials: Option<(String, String)>,
    bounds: Option<BoundingBox>,
    provenance: Provenance,
    http: reqwest::Client,
}

impl OpenSkySource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        interval: Duration,
        timeout: Duration,
        provenance: Provenance,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            url: url.into(),
            interval,
            credentials: None,
            bounds: None,
            provenance,
            http,
        })
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.credentials = Some((username, password));
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    fn query(&self) -> Vec<(&'static str, f64)> {
        match &self.bounds {
            // The API has no notion of a wrapped box; fetch everything and
            // let the read path filter.
            Some(b) if !b.crosses_antimeridian() => vec![
                ("lamin", b.lat_min),
                ("lomin", b.lon_min),
                ("lamax", b.lat_max),
                ("lomax", b.lon_max),
            ],
            _ => Vec::new(),
        }
    }
}

fn check_status(status: StatusCode) -> Result<(), SourceError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(SourceError::RateLimited)
    } else if !status.is_success() {
        Err(SourceError::Http(status.as_u16()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl IngestionSource for OpenSkySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }

    async fn fetch(&self) -> Result<RawBatch, SourceError> {
        let mut request = self.http.get(&self.url).query(&self.query());
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send().await?;
        check_status(response.status())?;
        let bytes = response.bytes().await?;
        let (time, rows) = parse_states_document(&bytes)?;

        log::debug!("{}: fetched {} rows", self.name, rows.len());
        Ok(RawBatch {
            rows,
            provenance: self.provenance.clone(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> OpenSkySource {
        OpenSkySource::new(
            "opensky",
            DEFAULT_OPENSKY_URL,
            Duration::from_secs(10),
            Duration::from_secs(5),
            Provenance::primary_feed(),
        )
        .unwrap()
    }

    #[test]
    fn status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(SourceError::RateLimited)
        ));
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(SourceError::Http(503))
        ));
    }

    #[test]
    fn bounding_box_goes_into_the_query() {
        let s = source();
        assert!(s.query().is_empty());

        let s = s.with_bounds(BoundingBox::new(45.0, 5.0, 55.0, 15.0).unwrap());
        assert_eq!(
            s.query(),
            vec![("lamin", 45.0), ("lomin", 5.0), ("lamax", 55.0), ("lomax", 15.0)]
        );
    }

    #[test]
    fn wrapped_box_fetches_everything() {
        let s = source().with_bounds(BoundingBox::new(-50.0, 170.0, -30.0, -170.0).unwrap());
        assert!(s.query().is_empty());
        assert_eq!(s.name(), "opensky");
        assert_eq!(s.poll_interval(), Duration::from_secs(10));
    }
}

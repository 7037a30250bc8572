use tracing::debug;

use super::SpotifyClient;
use crate::{
    Result,
    types::{SearchResponse, TrackSummary},
    utils,
};

impl SpotifyClient {
    /// Searches the catalogue and reshapes the matching tracks.
    ///
    /// Items keep the order Spotify returned them in. `limit` is clamped
    /// to 1..=50. Only the `tracks` section of the response is read, so a
    /// non-track `kind` yields an empty list.
    pub async fn search_tracks(
        &self,
        query: &str,
        kind: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>> {
        let limit = utils::clamp_limit(limit).to_string();

        let response: SearchResponse = self
            .get_json(
                &["search"],
                &[("q", query), ("type", kind), ("limit", limit.as_str())],
                "Failed to search Spotify",
            )
            .await?;

        let tracks: Vec<TrackSummary> = response
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .map(TrackSummary::from)
            .collect();

        debug!("Search '{}' returned {} tracks", query, tracks.len());
        Ok(tracks)
    }
}

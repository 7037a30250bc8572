use tracing::{debug, warn};

use super::SpotifyClient;
use crate::{
    Error, Result,
    types::{
        ArtistProfile, ArtistTopTracks, ArtistTrack, ListTracksRequest, SearchResponse,
        TopTracksResponse,
    },
};

impl SpotifyClient {
    /// Lists the top tracks of the best match for `artist_name`.
    ///
    /// Delegates to the separate tracks service when one is configured,
    /// otherwise asks the Web API directly.
    pub async fn artist_top_tracks(&self, artist_name: &str) -> Result<ArtistTopTracks> {
        match &self.tracks_service_url {
            Some(base) => self.top_tracks_from_service(base, artist_name).await,
            None => self.top_tracks_from_web_api(artist_name).await,
        }
    }

    async fn top_tracks_from_service(
        &self,
        base: &str,
        artist_name: &str,
    ) -> Result<ArtistTopTracks> {
        debug!("Listing tracks for '{}' through the tracks service", artist_name);

        let res = self
            .http
            .post(format!("{}/v1/list_tracks/", base))
            .json(&ListTracksRequest {
                artist_name: artist_name.to_string(),
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!("Tracks service answered {}", status);
            return Err(Error::upstream("Failed to list tracks by artist", status));
        }

        Ok(res.json::<ArtistTopTracks>().await?)
    }

    async fn top_tracks_from_web_api(&self, artist_name: &str) -> Result<ArtistTopTracks> {
        let found: SearchResponse = self
            .get_json(
                &["search"],
                &[("q", artist_name), ("type", "artist"), ("limit", "1")],
                "Failed to search artist",
            )
            .await?;

        let artist = found
            .artists
            .and_then(|page| page.items.into_iter().next())
            .ok_or_else(|| Error::ArtistNotFound(artist_name.to_string()))?;

        let top: TopTracksResponse = self
            .get_json(
                &["artists", artist.id.as_str(), "top-tracks"],
                &[("market", self.market.as_str())],
                "Failed to get top tracks",
            )
            .await?;

        Ok(ArtistTopTracks {
            artist: ArtistProfile::from(artist),
            tracks: top.tracks.into_iter().map(ArtistTrack::from).collect(),
        })
    }
}

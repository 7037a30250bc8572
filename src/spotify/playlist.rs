use tracing::{info, warn};

use super::SpotifyClient;
use crate::{
    Error, Result,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, CurrentUser, PlaylistRef, PlaylistSnapshot,
    },
    utils,
};

/// Most URIs the Web API accepts in one add-tracks call.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

impl SpotifyClient {
    /// Creates an empty playlist owned by the current user.
    ///
    /// Looks the user id up first, then creates the playlist under it.
    pub async fn create_user_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistRef> {
        let user: CurrentUser = self
            .get_json(&["me"], &[], "Failed to fetch current user")
            .await?;

        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public,
            collaborative: false,
        };

        let created: CreatePlaylistResponse = self
            .post_json(
                &["users", user.id.as_str(), "playlists"],
                &body,
                "Failed to create playlist",
            )
            .await?;

        info!("Created playlist {} for user {}", created.id, user.id);

        Ok(PlaylistRef {
            id: created.id,
            name: created.name,
            description: created.description.unwrap_or(body.description),
            public: created.public.unwrap_or(public),
            url: created.external_urls.spotify,
        })
    }

    /// Appends tracks to a playlist, in batches the Web API accepts.
    ///
    /// Bare track ids are turned into `spotify:track:` URIs. When a later
    /// batch fails the earlier ones stay in the playlist.
    pub async fn add_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<PlaylistSnapshot> {
        if uris.is_empty() {
            return Err(Error::InvalidParams(
                "at least one track URI is required".to_string(),
            ));
        }

        let uris: Vec<String> = uris.iter().map(|u| utils::normalize_track_uri(u)).collect();
        let segments = ["playlists", playlist_id, "tracks"];

        let mut snapshot_id = String::new();
        let mut added = 0;
        for chunk in uris.chunks(MAX_TRACKS_PER_REQUEST) {
            let body = AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            };

            let res: AddTrackToPlaylistResponse = match self
                .post_json(&segments, &body, "Failed to add tracks to playlist")
                .await
            {
                Ok(res) => res,
                Err(e) => {
                    if added > 0 {
                        warn!(
                            "{} of {} tracks were added to {} before the failure",
                            added,
                            uris.len(),
                            playlist_id
                        );
                    }
                    return Err(e);
                }
            };

            added += chunk.len();
            snapshot_id = res.snapshot_id;
        }

        info!("Added {} tracks to playlist {}", added, playlist_id);
        Ok(PlaylistSnapshot { snapshot_id, added })
    }
}

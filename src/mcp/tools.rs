use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    Error, Result,
    spotify::SpotifyApi,
    types::{ArtistTopTracks, PlaylistSnapshot, TrackSummary},
};

pub const SEARCH: &str = "search";
pub const CREATE_PLAYLIST: &str = "createPlaylist";
pub const ADD_TRACK_TO_PLAYLIST: &str = "addTrackToPlaylist";
pub const LIST_TRACKS_BY_ARTIST: &str = "listTracksByArtist";

fn default_search_type() -> String {
    "track".to_string()
}

fn default_search_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    pub query: String,
    #[serde(rename = "type", default = "default_search_type")]
    pub kind: String,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistArgs {
    pub playlist_name: String,
    #[serde(default)]
    pub playlist_description: String,
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackToPlaylistArgs {
    pub playlist_id: String,
    pub track_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTracksByArtistArgs {
    pub artist_name: String,
}

#[derive(Debug, Serialize)]
struct ToolSuccess<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

#[derive(Debug, Serialize)]
struct SearchData {
    tracks: Vec<TrackSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePlaylistData {
    playlist_id: String,
    name: String,
    url: Option<String>,
}

pub struct ToolsHandler {
    spotify: Arc<dyn SpotifyApi>,
}

impl ToolsHandler {
    pub fn new(spotify: Arc<dyn SpotifyApi>) -> Self {
        Self { spotify }
    }

    /// Runs a tool. Argument problems and unknown tools are protocol
    /// errors; Spotify failures come back as `success: false` results.
    pub async fn handle_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        info!("Calling tool {}", name);

        match name {
            SEARCH => {
                let args: SearchArgs = parse_args(arguments)?;
                let outcome = self
                    .spotify
                    .search(&args.query, &args.kind, args.limit)
                    .await
                    .map(|tracks| SearchData { tracks });
                Ok(tool_result(name, outcome))
            }
            CREATE_PLAYLIST => {
                let args: CreatePlaylistArgs = parse_args(arguments)?;
                let outcome = self
                    .spotify
                    .create_playlist(
                        &args.playlist_name,
                        &args.playlist_description,
                        args.is_public,
                    )
                    .await
                    .map(|playlist| CreatePlaylistData {
                        playlist_id: playlist.id,
                        name: playlist.name,
                        url: playlist.url,
                    });
                Ok(tool_result(name, outcome))
            }
            ADD_TRACK_TO_PLAYLIST => {
                let args: AddTrackToPlaylistArgs = parse_args(arguments)?;
                if args.track_uris.is_empty() {
                    return Err(Error::InvalidParams(
                        "trackUris must contain at least one track".to_string(),
                    ));
                }
                let outcome: Result<PlaylistSnapshot> = self
                    .spotify
                    .add_tracks_to_playlist(&args.playlist_id, &args.track_uris)
                    .await;
                Ok(tool_result(name, outcome))
            }
            LIST_TRACKS_BY_ARTIST => {
                let args: ListTracksByArtistArgs = parse_args(arguments)?;
                let outcome: Result<ArtistTopTracks> =
                    self.spotify.list_tracks_by_artist(&args.artist_name).await;
                Ok(tool_result(name, outcome))
            }
            _ => Err(Error::InvalidParams(format!("Tool {} not found", name))),
        }
    }

    pub fn list_tools() -> Vec<Value> {
        vec![
            json!({
                "name": SEARCH,
                "title": "Search Spotify tracks",
                "description": "Searches the Spotify catalogue and returns matching tracks with their URI, artists, album, popularity and preview URL.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query, e.g. an artist or track name"
                        },
                        "type": {
                            "type": "string",
                            "description": "Item type to search for",
                            "default": "track"
                        },
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": 50,
                            "default": 10
                        }
                    },
                    "required": ["query"]
                },
                "outputSchema": output_schema(json!({
                    "tracks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "uri": { "type": "string" },
                                "name": { "type": "string" },
                                "artists": { "type": "array", "items": { "type": "string" } },
                                "album": { "type": "string" },
                                "albumImage": { "type": ["string", "null"] },
                                "popularity": { "type": ["integer", "null"] },
                                "previewUrl": { "type": ["string", "null"] }
                            },
                            "required": ["uri", "name", "artists", "album"]
                        }
                    }
                }))
            }),
            json!({
                "name": CREATE_PLAYLIST,
                "title": "Create a new Spotify playlist",
                "description": "Creates a new playlist in the user's Spotify account. Provide a name, optional description, and choose whether it should be public or private. The playlist will be created empty and ready to add tracks.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "playlistName": { "type": "string" },
                        "playlistDescription": { "type": "string" },
                        "isPublic": { "type": "boolean" }
                    },
                    "required": ["playlistName", "isPublic"]
                },
                "outputSchema": output_schema(json!({
                    "playlistId": { "type": "string" },
                    "name": { "type": "string" },
                    "url": { "type": ["string", "null"] }
                }))
            }),
            json!({
                "name": ADD_TRACK_TO_PLAYLIST,
                "title": "Add tracks to a Spotify playlist",
                "description": "Adds one or more tracks to an existing playlist. Tracks are given as Spotify URIs (spotify:track:...) or bare track ids.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "playlistId": { "type": "string" },
                        "trackUris": {
                            "type": "array",
                            "items": { "type": "string" },
                            "minItems": 1
                        }
                    },
                    "required": ["playlistId", "trackUris"]
                },
                "outputSchema": output_schema(json!({
                    "snapshotId": { "type": "string" },
                    "added": { "type": "integer" }
                }))
            }),
            json!({
                "name": LIST_TRACKS_BY_ARTIST,
                "title": "List an artist's top tracks",
                "description": "Finds the artist best matching the given name and lists their top tracks.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "artistName": { "type": "string" }
                    },
                    "required": ["artistName"]
                },
                "outputSchema": output_schema(json!({
                    "artist": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "image": { "type": ["string", "null"] },
                            "followers": { "type": "integer" },
                            "genres": { "type": "array", "items": { "type": "string" } }
                        }
                    },
                    "tracks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": ["string", "null"] },
                                "name": { "type": "string" },
                                "album": { "type": "string" },
                                "albumImage": { "type": ["string", "null"] },
                                "duration": { "type": ["integer", "null"] },
                                "popularity": { "type": ["integer", "null"] },
                                "previewUrl": { "type": ["string", "null"] },
                                "spotifyUrl": { "type": ["string", "null"] }
                            }
                        }
                    }
                }))
            }),
        ]
    }
}

/// Every tool reports `success` and, on failure, a `message`.
fn output_schema(properties: Value) -> Value {
    let mut all = json!({
        "success": { "type": "boolean" },
        "message": { "type": "string" }
    });
    if let (Some(all), Some(extra)) = (all.as_object_mut(), properties.as_object()) {
        for (key, value) in extra {
            all.insert(key.clone(), value.clone());
        }
    }

    json!({
        "type": "object",
        "properties": all,
        "required": ["success"]
    })
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn tool_result<T: Serialize>(tool: &str, outcome: Result<T>) -> Value {
    let structured = match outcome.and_then(|data| {
        serde_json::to_value(ToolSuccess {
            success: true,
            data,
        })
        .map_err(Error::from)
    }) {
        Ok(value) => value,
        Err(e) => {
            warn!("Tool {} failed: {}", tool, e);
            json!({
                "success": false,
                "message": e.to_string()
            })
        }
    };

    json!({
        "content": [{
            "type": "text",
            "text": structured.to_string()
        }],
        "structuredContent": structured
    })
}

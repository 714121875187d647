use tracing::info;
use uuid::Uuid;

use crate::{
    models::playlist::{CompletionError, Playlist},
    repositories::PlaylistStore,
};

/// Flip the completion flag of one video of a user's playlist
///
/// Read-modify-write without locking; concurrent toggles on the same
/// playlist can lose an update.
pub async fn toggle_completion(
    store: &dyn PlaylistStore,
    playlist_id: Uuid,
    video_index: usize,
    user_id: Uuid,
) -> Result<Playlist, CompletionError> {
    let mut playlist = store
        .find_for_user(playlist_id, user_id)
        .await?
        .ok_or(CompletionError::NotFound)?;

    let completed = playlist.toggle_completion(video_index)?;
    store.update_completion(&playlist).await?;

    info!(
        "Video {} of playlist {} marked {}",
        video_index,
        playlist_id,
        if completed { "completed" } else { "not completed" }
    );
    Ok(playlist)
}

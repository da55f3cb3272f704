//! Fixed embed markup templates.
//!
//! Two opaque render functions, each taking a single remote-id parameter
//! and producing an HTML fragment. The MediaHub audio player uses ours;
//! MediaHub video embeds come verbatim from the provider, and VidShare
//! embeds are always synthesized here from the extracted remote id.

/// Audio player fragment for a MediaHub media id.
pub fn audio_embed(media_id: &str) -> String {
    format!(
        "<iframe class=\"medialift-audio\" src=\"https://player.mediahub.tv/audio/{}\" \
         width=\"480\" height=\"86\" frameborder=\"0\"></iframe>",
        media_id
    )
}

/// Video player fragment for a VidShare video id.
pub fn video_embed(video_id: &str) -> String {
    format!(
        "<iframe class=\"medialift-video\" src=\"https://vidshare.tv/embed/{}\" \
         width=\"640\" height=\"360\" frameborder=\"0\" allowfullscreen></iframe>",
        video_id
    )
}

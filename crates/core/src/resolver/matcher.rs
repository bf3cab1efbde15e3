//! Containment matching between a post title and catalog results.

use crate::external_catalog::Track;

/// True iff the lowercased title contains the track name and at least one
/// of the artist names.
///
/// Empty names never match; a track without artists never matches.
pub fn is_match(title: &str, track: &Track) -> bool {
    let title = title.to_lowercase();
    let name = track.name.trim().to_lowercase();

    if name.is_empty() || !title.contains(&name) {
        return false;
    }

    track.artists.iter().any(|artist| {
        let artist = artist.name.trim().to_lowercase();
        !artist.is_empty() && title.contains(&artist)
    })
}

/// First track in catalog order that matches `title`.
pub fn find_match<'a>(title: &str, tracks: &'a [Track]) -> Option<&'a Track> {
    tracks.iter().find(|track| is_match(title, track))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_catalog::Artist;

    fn track(id: &str, name: &str, artists: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            name: name.to_string(),
            artists: artists
                .iter()
                .map(|a| Artist {
                    id: format!("artist-{}", a),
                    name: a.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_match_case_insensitive() {
        let t = track("1", "Song", &["Artist"]);
        assert!(is_match("ARTIST - song (Live)", &t));
    }

    #[test]
    fn test_match_any_artist() {
        let t = track("1", "Song", &["Nobody", "Featured"]);
        assert!(is_match("Featured - Song", &t));
    }

    #[test]
    fn test_reject_missing_artist() {
        let t = track("1", "Song", &["Someone Else"]);
        assert!(!is_match("Artist - Song", &t));
    }

    #[test]
    fn test_reject_missing_name() {
        let t = track("1", "Another Song", &["Artist"]);
        assert!(!is_match("Artist - Song", &t));
    }

    #[test]
    fn test_reject_empty_names() {
        assert!(!is_match("Artist - Song", &track("1", "", &["Artist"])));
        assert!(!is_match("Artist - Song", &track("1", "Song", &[""])));
        assert!(!is_match("Artist - Song", &track("1", "Song", &[])));
    }

    #[test]
    fn test_find_match_keeps_catalog_order() {
        let tracks = vec![
            track("1", "Other", &["Artist"]),
            track("2", "Song", &["Artist"]),
            track("3", "Song", &["Artist"]),
        ];
        let found = find_match("Artist - Song", &tracks).unwrap();
        assert_eq!(found.id, "2");
    }

    #[test]
    fn test_find_match_none() {
        let tracks = vec![track("1", "Other", &["Artist"])];
        assert!(find_match("Artist - Song", &tracks).is_none());
        assert!(find_match("Artist - Song", &[]).is_none());
    }
}

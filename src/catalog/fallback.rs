//! Built-in content shown when the metadata provider is unreachable, and
//! image URL helpers.

use super::types::{Genre, Movie, Title, TvShow};

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

const POSTER_PLACEHOLDER: &str = "https://images.pexels.com/photos/7991579/pexels-photo-7991579.jpeg?auto=compress&cs=tinysrgb&w=500&h=750&fit=crop";
const BACKDROP_PLACEHOLDER: &str = "https://images.pexels.com/photos/7991579/pexels-photo-7991579.jpeg?auto=compress&cs=tinysrgb&w=1280&h=720&fit=crop";

/// Poster URL at `w500`, or a placeholder when the title has no poster.
pub fn poster_url(path: Option<&str>) -> String {
    image_url(path, "w500").unwrap_or_else(|| POSTER_PLACEHOLDER.to_string())
}

/// Backdrop URL at `w1280`, or a placeholder.
pub fn backdrop_url(path: Option<&str>) -> String {
    image_url(path, "w1280").unwrap_or_else(|| BACKDROP_PLACEHOLDER.to_string())
}

fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{}/{}{}", IMAGE_BASE_URL, size, path))
}

/// Static genre taxonomy used when the genre endpoint fails or is empty.
pub fn sample_genres() -> Vec<Genre> {
    [
        (28, "Action"),
        (12, "Adventure"),
        (16, "Animation"),
        (35, "Comedy"),
        (80, "Crime"),
        (99, "Documentary"),
        (18, "Drama"),
        (10751, "Family"),
        (14, "Fantasy"),
        (36, "History"),
        (27, "Horror"),
        (10402, "Music"),
        (9648, "Mystery"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (10770, "TV Movie"),
        (53, "Thriller"),
        (10752, "War"),
        (37, "Western"),
    ]
    .into_iter()
    .map(|(id, name)| Genre {
        id,
        name: name.to_string(),
    })
    .collect()
}

fn sample_movie(
    id: i64,
    title: &str,
    poster: &str,
    backdrop: &str,
    overview: &str,
    release_date: &str,
    rating: f64,
) -> Title {
    Title::Movie(Movie {
        id,
        title: title.to_string(),
        overview: Some(overview.to_string()),
        poster_path: Some(poster.to_string()),
        backdrop_path: Some(backdrop.to_string()),
        release_date: Some(release_date.to_string()),
        vote_average: Some(rating),
        ..Default::default()
    })
}

fn sample_show(
    id: i64,
    name: &str,
    poster: &str,
    backdrop: &str,
    overview: &str,
    first_air_date: &str,
    rating: f64,
) -> Title {
    Title::Tv(TvShow {
        id,
        name: name.to_string(),
        overview: Some(overview.to_string()),
        poster_path: Some(poster.to_string()),
        backdrop_path: Some(backdrop.to_string()),
        first_air_date: Some(first_air_date.to_string()),
        vote_average: Some(rating),
        ..Default::default()
    })
}

/// Six well-known titles standing in for the trending list.
pub fn sample_trending() -> Vec<Title> {
    vec![
        sample_movie(
            1,
            "The Dark Knight",
            "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
            "/hqkIcbrOHL86UncnHIsHVcVmzue.jpg",
            "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",
            "2008-07-18",
            9.0,
        ),
        sample_movie(
            2,
            "Inception",
            "/9gk7adHYeDvHkCSEqAvQNLV5Uge.jpg",
            "/s3TBrRGB1iav7gFOCNx3H31MoES.jpg",
            "Cobb, a skilled thief who commits corporate espionage by infiltrating the subconscious of his targets is offered a chance to regain his old life as payment for a task considered to be impossible.",
            "2010-07-16",
            8.8,
        ),
        sample_show(
            3,
            "Breaking Bad",
            "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
            "/tsRy63Mu5cu8etL1X7ZLyf7UP1M.jpg",
            "A high school chemistry teacher diagnosed with inoperable lung cancer turns to manufacturing and selling methamphetamine in order to secure his family's future.",
            "2008-01-20",
            9.5,
        ),
        sample_movie(
            4,
            "The Shawshank Redemption",
            "/q6y0Go1tsGEsmtFryDOJo3dEmqu.jpg",
            "/iNh3BivHyg5sQRPP1KOkzguEX0H.jpg",
            "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
            "1994-09-23",
            9.3,
        ),
        sample_show(
            5,
            "Stranger Things",
            "/49WJfeN0moxb9IPfGn8AIqMGskD.jpg",
            "/56v2KjBlU4XaOv9rVYEQypROD7P.jpg",
            "When a young boy vanishes, a small town uncovers a mystery involving secret experiments, terrifying supernatural forces, and one strange little girl.",
            "2016-07-15",
            8.7,
        ),
        sample_movie(
            6,
            "Pulp Fiction",
            "/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg",
            "/4cDFJr4HnXN5AdPw4AKrmLlMWdO.jpg",
            "The lives of two mob hitmen, a boxer, a gangster and his wife, and a pair of diner bandits intertwine in four tales of violence and redemption.",
            "1994-10-14",
            8.9,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaType;

    #[test]
    fn test_image_urls() {
        assert_eq!(
            poster_url(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            backdrop_url(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w1280/abc.jpg"
        );
        assert_eq!(poster_url(None), POSTER_PLACEHOLDER);
        assert_eq!(backdrop_url(Some("")), BACKDROP_PLACEHOLDER);
    }

    #[test]
    fn test_sample_trending_mixes_types() {
        let titles = sample_trending();
        assert_eq!(titles.len(), 6);
        let shows = titles
            .iter()
            .filter(|t| t.media_type() == MediaType::Tv)
            .count();
        assert_eq!(shows, 2);
        assert_eq!(titles[1].display_title(), "Inception");
    }

    #[test]
    fn test_sample_genres() {
        let genres = sample_genres();
        assert_eq!(genres.len(), 19);
        assert_eq!(genres[0].name, "Action");
        assert!(genres.iter().any(|g| g.id == 878 && g.name == "Science Fiction"));
    }
}

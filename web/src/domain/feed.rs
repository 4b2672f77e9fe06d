//! Home feed content.
//!
//! The backend exposes no feed endpoint yet, so the home page serves a fixed
//! set of sample threads.

use serde::Serialize;
use utoipa::ToSchema;

/// Author shown on a thread card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadAuthor {
    pub name: String,
    pub username: String,
    pub avatar: String,
}

/// One thread card in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPost {
    pub id: u32,
    pub author: ThreadAuthor,
    pub content: String,
    pub images: Vec<String>,
    pub likes: u32,
    /// `likes` as rendered on the card, e.g. `1K`.
    pub likes_label: String,
    pub replies: u32,
    pub reposts: u32,
    pub shares: u32,
    /// Relative age as displayed, e.g. `13 giờ`.
    pub posted: String,
}

/// Compact counter label: thousands are floored to `NK`.
///
/// # Examples
/// ```
/// use threads_web::domain::compact_count;
///
/// assert_eq!(compact_count(1_600), "1K");
/// assert_eq!(compact_count(721), "721");
/// ```
pub fn compact_count(count: u32) -> String {
    if count >= 1_000 {
        format!("{}K", count / 1_000)
    } else {
        count.to_string()
    }
}

struct Sample {
    id: u32,
    name: &'static str,
    username: &'static str,
    avatar: u8,
    content: &'static str,
    images: &'static [&'static str],
    likes: u32,
    replies: u32,
    reposts: u32,
    shares: u32,
    posted: &'static str,
}

const SAMPLES: [Sample; 4] = [
    Sample {
        id: 1,
        name: "ttt_th8",
        username: "ttt_th8",
        avatar: 1,
        content: "t không lười makeup, lười tẩy trang",
        images: &[
            "https://images.unsplash.com/photo-1596462502278-27bfdc403348?w=400&h=400&fit=crop",
            "https://images.unsplash.com/photo-1522335789203-aabd1fc54bc9?w=400&h=400&fit=crop",
            "https://images.unsplash.com/photo-1487412947147-5cebf100ffc2?w=400&h=400&fit=crop",
        ],
        likes: 1_600,
        replies: 13,
        reposts: 33,
        shares: 4,
        posted: "13 giờ",
    },
    Sample {
        id: 2,
        name: "quynhquin",
        username: "quynhquin",
        avatar: 2,
        content: "Ngày đó mẹ viết cho ba thì biết mẹ yêu ba nhiều cỡ nào 🔒",
        images: &[
            "https://images.unsplash.com/photo-1516589178581-6cd7833ae3b2?w=600&h=400&fit=crop",
        ],
        likes: 515,
        replies: 2,
        reposts: 24,
        shares: 2,
        posted: "10 giờ",
    },
    Sample {
        id: 3,
        name: "_hongtrakcheese_",
        username: "hongtrakcheese",
        avatar: 3,
        content: "1 tim bố m nghỉ việc",
        images: &[],
        likes: 721,
        replies: 17,
        reposts: 43,
        shares: 2,
        posted: "13 giờ",
    },
    Sample {
        id: 4,
        name: "satamaki_horse",
        username: "satamaki_horse",
        avatar: 4,
        content: "mood hôm nay",
        images: &[
            "https://images.unsplash.com/photo-1574158622682-e40e69881006?w=600&h=600&fit=crop",
        ],
        likes: 234,
        replies: 8,
        reposts: 12,
        shares: 1,
        posted: "14 giờ",
    },
];

/// Sample threads shown on the home page, newest first.
pub fn sample_feed() -> Vec<ThreadPost> {
    SAMPLES
        .iter()
        .map(|sample| ThreadPost {
            id: sample.id,
            author: ThreadAuthor {
                name: sample.name.to_owned(),
                username: sample.username.to_owned(),
                avatar: format!("https://i.pravatar.cc/100?img={}", sample.avatar),
            },
            content: sample.content.to_owned(),
            images: sample.images.iter().map(|url| (*url).to_owned()).collect(),
            likes: sample.likes,
            likes_label: compact_count(sample.likes),
            replies: sample.replies,
            reposts: sample.reposts,
            shares: sample.shares,
            posted: sample.posted.to_owned(),
        })
        .collect()
}

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::content::{self, ContentBlock};
use crate::domain::{BlogPost, SeriesNav};
use crate::gateway::Gateway;
use crate::store::LikedStore;
use crate::views::PageState;

pub const POST_NOT_FOUND: &str = "Blog not found";
pub const POST_FAILED: &str = "Failed to load blog";

#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: BlogPost,
    pub blocks: Vec<ContentBlock>,
    pub html: String,
    pub liked: bool,
    /// Next part of the series, when the post has one.
    pub series: Option<SeriesNav>,
    pub suggested: Vec<BlogPost>,
}

impl PostView {
    /// A standalone HTML page: header, article, series link and suggestions.
    pub fn document(&self) -> String {
        let post = &self.post;
        let title = encode_text(&post.title);
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
        let _ = writeln!(html, "<header>\n<h1>{title}</h1>");
        let _ = writeln!(
            html,
            "<p class=\"post-meta\">{} · {} min read · {} views · {} likes</p>",
            post.display_date(),
            post.read_time,
            post.views,
            post.likes
        );
        if let Some(image) = post.featured_image.as_deref().filter(|src| !content::is_unsafe_url(src)) {
            let _ = writeln!(
                html,
                "<img class=\"featured\" src=\"{}\" alt=\"{}\">",
                encode_double_quoted_attribute(image),
                encode_double_quoted_attribute(&post.title)
            );
        }
        html.push_str("</header>\n");
        html.push_str(&self.html);
        html.push('\n');

        if let Some(series) = &self.series {
            let _ = writeln!(
                html,
                "<nav class=\"series-next\"><a href=\"{}\">Continue reading: {} · {}</a></nav>",
                encode_double_quoted_attribute(&series.href()),
                series.label(),
                encode_text(&series.next.title)
            );
        }

        if !self.suggested.is_empty() {
            html.push_str("<aside class=\"suggested-reading\">\n<h2>Suggested Reading</h2>\n<ul>\n");
            for next in &self.suggested {
                let _ = writeln!(
                    html,
                    "<li><a href=\"/blogs/{}\">{}</a></li>",
                    encode_double_quoted_attribute(&next.slug),
                    encode_text(&next.title)
                );
            }
            html.push_str("</ul>\n</aside>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Load a post by slug with everything its page shows.
///
/// An unknown slug is [`PageState::Empty`], shown as [`POST_NOT_FOUND`].
/// Only the slug lookup can fail the page. The view count, the related
/// post and the suggested posts are fetched together afterwards; their
/// failures are logged and leave the matching part empty.
pub async fn load_post(gateway: &Gateway, likes: &dyn LikedStore, slug: &str) -> PageState<PostView> {
    let post = match gateway.try_post_by_slug(slug).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            tracing::info!(slug, "no post for slug");
            return PageState::Empty;
        }
        Err(e) => {
            tracing::error!(slug, error = %e, "failed to load post");
            return PageState::Failed(POST_FAILED.to_string());
        }
    };

    let liked = likes.is_liked(&post.id).unwrap_or_else(|e| {
        tracing::warn!(post = %post.id, error = %e, "could not read liked state");
        false
    });

    let suggested_ids = post.suggested_ids();
    let (_, related, suggested) = futures::join!(
        gateway.increment_views(&post.id),
        async {
            match post.related_id() {
                Some(id) => gateway.post_by_id(id).await,
                None => None,
            }
        },
        async {
            if suggested_ids.is_empty() {
                Vec::new()
            } else {
                gateway.posts_by_ids(&suggested_ids).await
            }
        },
    );

    let blocks = post.blocks();
    let html = content::render_article(&blocks);
    let series = post.series_navigation(related);

    PageState::Ready(PostView {
        post,
        blocks,
        html,
        liked,
        series,
        suggested,
    })
}

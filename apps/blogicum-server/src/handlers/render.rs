//! Domain values to wire DTOs.

use blogicum_core::domain::{Category, CommentEntry, Location, PostEntry, User};
use blogicum_core::pagination::Page;
use blogicum_core::policy::{self, Requester};
use blogicum_shared::dto::{
    CategoryResponse, CommentResponse, LocationResponse, PageResponse, PostResponse,
    UserResponse,
};

pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        created_at: user.created_at,
    }
}

/// Profile as seen by `requester`; only the owner sees the email address.
pub fn profile(profile: User, requester: &Requester) -> UserResponse {
    let owner = requester.is(profile.id);
    let mut response = user(profile);
    if !owner {
        response.email.clear();
    }
    response
}

pub fn category(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title,
        description: category.description,
        slug: category.slug,
    }
}

fn location(location: Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name,
    }
}

pub fn post(entry: PostEntry, requester: &Requester) -> PostResponse {
    let can_edit = policy::can_mutate_post(&entry.post, requester);
    let post = entry.post;

    PostResponse {
        id: post.id,
        title: post.title,
        text: post.text,
        pub_date: post.pub_date,
        is_published: post.is_published,
        image: post.image,
        author: entry.author_username,
        category: entry.category.map(category),
        location: entry.location.map(location),
        comment_count: entry.comment_count,
        created_at: post.created_at,
        can_edit,
    }
}

pub fn comment(entry: CommentEntry, requester: &Requester) -> CommentResponse {
    CommentResponse {
        can_edit: policy::can_mutate_comment(&entry.comment, requester),
        id: entry.comment.id,
        post_id: entry.comment.post_id,
        author: entry.author_username,
        text: entry.comment.text,
        created_at: entry.comment.created_at,
    }
}

pub fn page<T, U>(page: Page<T>, render: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    let page = page.map(render);

    PageResponse {
        items: page.items,
        number: page.number,
        page_size: page.page_size,
        total_items: page.total_items,
        num_pages: page.num_pages,
        has_next,
        has_previous,
    }
}

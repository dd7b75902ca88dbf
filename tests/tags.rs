//! Render operations driven the way a template engine would call them.

mod helpers;

use async_trait::async_trait;
use flickr_gallery::models::{QueryError, SearchQuery};
use flickr_gallery::page::{Page, PageSettings, RenderContext, Resolution, render_context_for};
use flickr_gallery::tags::{
    self, Attributes, Expand, Renderer, SetField, TagError, photo_src, photo_title, set_title,
    set_url,
};
use helpers::{OWNER, StubService, cache_for, registry, stub};

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs.iter().copied().collect()
}

/// A context outside any gallery page.
fn plain_context() -> RenderContext {
    let page = Page::new(
        "home",
        PageSettings {
            url: "/".to_owned(),
            title: "Home".to_owned(),
            ..Default::default()
        },
    );
    RenderContext::new(page, None, Resolution::unresolved())
}

async fn page_context(renderer: &Renderer, path: &str) -> RenderContext {
    render_context_for(&registry(), renderer.cache(), path)
        .await
        .unwrap()
}

#[test]
fn slideshow_embeds() {
    assert_eq!(
        tags::slideshow(&attrs(&[("user", "user"), ("tags", "foo,bar")])).unwrap(),
        "<iframe align=\"center\" src=\"http://www.flickr.com/slideShow/index.gne?user_id=user&tags=foo,bar\" frameBorder=\"0\" width=\"500\" scrolling=\"no\" height=\"500\"></iframe>\n"
    );
    assert_eq!(
        tags::slideshow(&attrs(&[("user", "user"), ("set", "123456")])).unwrap(),
        "<iframe align=\"center\" src=\"http://www.flickr.com/slideShow/index.gne?user_id=user&set_id=123456\" frameBorder=\"0\" width=\"500\" scrolling=\"no\" height=\"500\"></iframe>\n"
    );
}

#[test]
fn slideshow_errors_are_distinct() {
    let messages = [
        tags::slideshow(&attrs(&[])),
        tags::slideshow(&attrs(&[("user", "u"), ("set", "1"), ("tags", "a")])),
        tags::slideshow(&attrs(&[("user", "u")])),
    ]
    .map(|r| r.unwrap_err().to_string());

    assert_eq!(
        messages,
        [
            "slideshow tag requires a Flickr NSID in the `user' attribute",
            "slideshow tag must have either a `set' or `tags' attribute, not both",
            "slideshow tag must have a `set' or `tags' attribute",
        ]
    );
}

#[tokio::test]
async fn photos_by_user_iterates_search_results() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();

    let out = renderer
        .photos(&mut ctx, &attrs(&[("user", OWNER)]), &mut photo_title)
        .await
        .unwrap();

    assert_eq!(out, "Photo 1Photo 2");
    assert_eq!(ctx.depth(), 0);
}

#[tokio::test]
async fn photos_on_a_set_page_use_the_page_set() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos/summer-trip/set").await;

    let out = renderer
        .photos(&mut ctx, &Attributes::default(), &mut |ctx: &RenderContext| -> Result<String, TagError> {
            Ok(format!("[{}]", photo_src(ctx, &attrs(&[("size", "Square")]))?))
        })
        .await
        .unwrap();

    assert_eq!(
        out,
        "[https://farm66.staticflickr.com/65535/101_s3cr3t_s.jpg][https://farm66.staticflickr.com/65535/102_s3cr3t_s.jpg]"
    );
    assert_eq!(StubService::calls(&service.list_photos_calls), 1);
    assert_eq!(StubService::calls(&service.search_calls), 0);
}

#[tokio::test]
async fn photos_on_a_tags_page_search_the_owner() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos/beach/tags").await;

    renderer
        .photos(&mut ctx, &Attributes::default(), &mut photo_title)
        .await
        .unwrap();

    let query = service.last_search.lock().unwrap().clone().unwrap();
    assert_eq!(query.user_id(), Some(OWNER));
    assert_eq!(query.tags(), Some("beach"));
}

#[tokio::test]
async fn photos_bind_the_cached_instances() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();
    let query = SearchQuery::new(Some(OWNER), None, None, None).unwrap();
    let cached = renderer.cache().cached_search_photos(&query).await;

    let mut shared = Vec::new();
    renderer
        .photos(&mut ctx, &attrs(&[("user", OWNER)]), &mut |ctx: &RenderContext| -> Result<String, TagError> {
            let bound = ctx.current_photo().ok_or(TagError::NoPhoto)?;
            shared.push(cached.iter().any(|p| std::ptr::eq(p.as_ref(), bound)));
            Ok(String::new())
        })
        .await
        .unwrap();

    assert_eq!(shared, [true, true]);
    assert_eq!(StubService::calls(&service.search_calls), 1);
}

#[tokio::test]
async fn blank_search_attributes_fail_before_any_request() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();

    let err = renderer
        .photos(&mut ctx, &attrs(&[("user", "  "), ("tags", " , ")]), &mut photo_title)
        .await
        .unwrap_err();

    assert_eq!(err, TagError::Query(QueryError::MissingUserOrTags));
    assert_eq!(StubService::calls(&service.search_calls), 0);
}

#[tokio::test]
async fn photos_validation() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();

    let err = renderer
        .photos(&mut ctx, &attrs(&[("user", OWNER), ("per_page", "12345")]), &mut photo_title)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "`per_page' attribute of `photos' tag must be a positive number between 1 and 4 digits"
    );

    let err = renderer
        .photos(&mut ctx, &Attributes::default(), &mut photo_title)
        .await
        .unwrap_err();
    assert_eq!(err, TagError::PhotosSource);
    assert_eq!(StubService::calls(&service.search_calls), 0);
}

#[tokio::test]
async fn sets_iterate_in_listing_order() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos").await;

    let out = renderer
        .sets(&mut ctx, &Attributes::default(), &mut |ctx: &RenderContext| -> Result<String, TagError> {
            Ok(format!("{}={};", set_title(ctx)?, set_url(ctx, &Attributes::default())?))
        })
        .await
        .unwrap();

    assert_eq!(
        out,
        "Summer Trip=/photos/summer-trip;Winter Walks=/photos/winter-walks;Été à Paris=/photos/ete-a-paris;"
    );
}

#[tokio::test]
async fn sets_need_an_owner_off_gallery_pages() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();

    let err = renderer
        .sets(&mut ctx, &Attributes::default(), &mut set_title)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "The `sets' tag requires at least the `user' attribute.");
}

#[tokio::test]
async fn set_binds_the_page_set_or_a_named_one() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));

    let mut ctx = page_context(&renderer, "/photos/winter-walks").await;
    let out = renderer
        .set(&mut ctx, &Attributes::default(), &mut |ctx: &RenderContext| -> Result<String, TagError> {
            tags::set_field(ctx, SetField::NumPhotos)
        })
        .await
        .unwrap();
    assert_eq!(out, "2");

    let mut ctx = page_context(&renderer, "/photos").await;
    let out = renderer
        .set(&mut ctx, &attrs(&[("set", "721")]), &mut set_title)
        .await
        .unwrap();
    assert_eq!(out, "Summer Trip");

    let out = renderer
        .set(&mut ctx, &attrs(&[("set", "999")]), &mut set_title)
        .await
        .unwrap();
    assert_eq!(out, "");
}

#[tokio::test]
async fn set_errors() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));

    let mut ctx = page_context(&renderer, "/photos/no-such-trip/set").await;
    let err = renderer
        .set(&mut ctx, &Attributes::default(), &mut set_title)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "you are on a set page, but we could not find the set of the page"
    );

    let mut ctx = page_context(&renderer, "/photos").await;
    let err = renderer
        .set(&mut ctx, &Attributes::default(), &mut set_title)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "if you are not in a set context you must provide a set attribute"
    );
}

/// `<sets><primary><primary_src size="thumbnail"/></primary></sets>`
struct PrimaryThumbnails<'a> {
    renderer: &'a Renderer,
}

#[async_trait]
impl Expand for PrimaryThumbnails<'_> {
    async fn expand(&mut self, ctx: &mut RenderContext) -> Result<String, TagError> {
        self.renderer
            .primary(ctx, &mut |ctx: &RenderContext| -> Result<String, TagError> {
                tags::primary_src(ctx, &attrs(&[("size", "thumbnail")]))
            })
            .await
    }
}

#[tokio::test]
async fn primary_photo_nested_in_sets() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos").await;

    let out = renderer
        .sets(
            &mut ctx,
            &Attributes::default(),
            &mut PrimaryThumbnails {
                renderer: &renderer,
            },
        )
        .await
        .unwrap();

    // 201 is not a known photo and the third set has no cover.
    assert_eq!(out, "https://farm66.staticflickr.com/65535/101_s3cr3t_t.jpg");
    assert_eq!(StubService::calls(&service.get_photo_calls), 2);
    assert_eq!(ctx.depth(), 0);
}

#[tokio::test]
async fn failing_body_still_unbinds() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = plain_context();

    let err = renderer
        .photos(&mut ctx, &attrs(&[("tags", "beach")]), &mut |_: &RenderContext| -> Result<String, TagError> {
            Err(TagError::Engine("boom".into()))
        })
        .await
        .unwrap_err();

    assert_eq!(err, TagError::Engine("boom".into()));
    assert_eq!(ctx.depth(), 0);
    assert!(ctx.current_photo().is_none());
}

#[tokio::test]
async fn bindings_do_not_leak_between_siblings() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos/summer-trip").await;

    renderer
        .sets(&mut ctx, &attrs(&[("user", OWNER)]), &mut set_title)
        .await
        .unwrap();

    // Back outside `sets`, the current set is the page's own again.
    assert_eq!(set_title(&ctx).unwrap(), "Summer Trip");
    assert!(photo_title(&ctx).is_err());
}

#[tokio::test]
async fn conditionals_follow_the_page_mode() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut yes = |_: &RenderContext| -> Result<String, TagError> { Ok("yes".to_owned()) };

    let mut index = page_context(&renderer, "/photos").await;
    assert_eq!(tags::if_index(&mut index, &mut yes).await.unwrap(), "yes");
    assert_eq!(tags::unless_index(&mut index, &mut yes).await.unwrap(), "");
    assert_eq!(tags::if_gallery(&mut index, &mut yes).await.unwrap(), "");
    assert_eq!(tags::unless_gallery(&mut index, &mut yes).await.unwrap(), "yes");

    let mut set = page_context(&renderer, "/photos/summer-trip/set").await;
    assert_eq!(tags::if_index(&mut set, &mut yes).await.unwrap(), "");
    assert_eq!(tags::if_gallery(&mut set, &mut yes).await.unwrap(), "yes");
}

#[tokio::test]
async fn link_to_the_current_set() {
    let service = stub();
    let renderer = Renderer::new(cache_for(&service));
    let mut ctx = page_context(&renderer, "/photos/summer-trip/set").await;

    assert_eq!(tags::gallery_url(&ctx).unwrap(), "/photos/summer-trip");

    let link = tags::link(
        &mut ctx,
        &attrs(&[("anchor", "top"), ("CLASS", "a \"b\"")]),
        None,
    )
    .await
    .unwrap();
    assert_eq!(
        link,
        r#"<a href="/photos/summer-trip#top" class="a &quot;b&quot;">Summer Trip</a>"#
    );

    let mut text = |_: &RenderContext| -> Result<String, TagError> { Ok("Go".to_owned()) };
    let link = tags::link(&mut ctx, &Attributes::default(), Some(&mut text))
        .await
        .unwrap();
    assert_eq!(link, r#"<a href="/photos/summer-trip">Go</a>"#);
}

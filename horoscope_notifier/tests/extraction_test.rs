use horoscope_notifier::article::extract_article;
use horoscope_notifier::extract::{
    apply_rules, extract_text, reconstruct, select_body, ExtractOptions, Selection,
    PUNCTUATION_RULES,
};
use horoscope_notifier::format::{prepare_body, MAX_MESSAGE_CHARS};
use horoscope_notifier::Content;
use scraper::Html;
use url::Url;

const ASKJIYUN_POST: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>오늘의 운세, 10월 18일 - askjiyun.com</title>
  <script>window.ads = [];</script>
</head>
<body>
  <header><nav>홈 | 오늘의 운세 | 게시판</nav></header>
  <div class="board_read">
    <div class="rd_body">
      <div class="xe_content">
        <p>[오늘의 운세] 10월 18일 토요일</p>
        <p>〈쥐띠〉</p>
        <p>48 년생 재물이 들어오는 날 .<br>60 년생 건강에 유의하세요 .</p>
        <p>운세지수<br>93<br>%.</p>
        <div class="share_area">페이스북 공유 트위터 공유</div>
        <p>이 게시물을 공유해주세요</p>
      </div>
    </div>
  </div>
  <footer>출처: askjiyun</footer>
</body>
</html>"#;

#[test]
fn xe_content_paragraph_survives_and_footer_is_dropped() {
    let html = r#"<div class="xe_content"><p>오늘의 운세 입니다 .</p><p>이 게시물을 공유해주세요</p></div>"#;
    assert_eq!(extract_text(html, &ExtractOptions::default()), "오늘의 운세 입니다.");
}

#[test]
fn realistic_post_is_cleaned() {
    let text = extract_text(ASKJIYUN_POST, &ExtractOptions::default());
    assert_eq!(
        text,
        "[오늘의 운세] 10월 18일 토요일\n\n\
         〈쥐띠〉\n\n\
         48년생 재물이 들어오는 날. 60년생 건강에 유의하세요.\n\n\
         운세지수 93%."
    );
}

#[test]
fn realistic_post_chat_layout() {
    let text = extract_text(ASKJIYUN_POST, &ExtractOptions::default());
    assert_eq!(
        prepare_body(&text, true),
        "[오늘의 운세] 10월 18일 토요일\n\n\
         〈쥐띠〉\n\n\
         48년생\n재물이 들어오는 날.\n60년생\n건강에 유의하세요.\n운세지수 93%."
    );
}

#[test]
fn image_only_article_yields_image_list() {
    let html = r#"<article><img src="a.jpg"><img src="b.png"></article>"#;
    let page = Url::parse("https://askjiyun.com/today/300").unwrap();
    let article = extract_article(html, &page, &ExtractOptions::default());
    match article.content {
        Content::Images(urls) => {
            assert_eq!(urls.len(), 2);
            assert!(urls.iter().all(|u| u.starts_with("https://askjiyun.com/")));
        }
        other => panic!("expected images, got {other:?}"),
    }
}

#[test]
fn no_structure_means_full_document_text() {
    let doc = Html::parse_document("<p>줄 하나</p><p>줄   둘</p>");
    let options = ExtractOptions::default();
    let selection = select_body(&doc, &options);
    assert!(matches!(selection, Selection::FullDocument));
    assert_eq!(reconstruct(&doc, &selection, &options), "줄 하나\n줄 둘");
}

#[test]
fn pruned_to_nothing_still_returns_raw_text() {
    let html = r#"<div class="xe_content"><p>댓글 쓰기</p><div class="social">공유</div></div>"#;
    let text = extract_text(html, &ExtractOptions::default());
    assert_eq!(text, "댓글 쓰기\n공유");
}

#[test]
fn long_paragraph_with_marker_is_retained() {
    let paragraph = format!("오늘은 주변과 행운을 공유하는 날{}", "입니다".repeat(62));
    assert!(paragraph.chars().count() >= 200);
    let html = format!(r#"<div class="xe_content"><p>{paragraph}</p></div>"#);
    assert_eq!(extract_text(&html, &ExtractOptions::default()), paragraph);
}

#[test]
fn punctuation_repair_twice_equals_once() {
    let text = extract_text(ASKJIYUN_POST, &ExtractOptions::default());
    let once = apply_rules(&PUNCTUATION_RULES, &text);
    assert_eq!(apply_rules(&PUNCTUATION_RULES, &once), once);
}

#[test]
fn overridden_threshold_changes_filtering() {
    let html = r#"<div class="xe_content"><p>본문</p><p>출처: 어딘가 아주 긴 설명</p></div>"#;
    let options = ExtractOptions {
        boilerplate_max_chars: 5,
        ..ExtractOptions::default()
    };
    assert_eq!(extract_text(html, &options), "본문\n\n출처: 어딘가 아주 긴 설명");
    assert_eq!(extract_text(html, &ExtractOptions::default()), "본문");
}

#[test]
fn default_cap_matches_chat_limit() {
    assert_eq!(MAX_MESSAGE_CHARS, 14_000);
}

mod common;

use common::Harness;
use content::ContentConfig;
use content::scripts::ScriptMode;
use core_types::{ContentStatus, ResourceKind};

#[test]
fn inline_scripts_run_in_document_order() {
    let mut h = Harness::new();
    h.load(
        "<html><body><script>log one</script><p>between</p>\
         <script type=text/plain>log never</script>\
         <script language=javascript1.2>log two</script></body></html>",
    );
    assert_eq!(h.engine_log(), vec!["one", "two", "event:load"]);
    assert_eq!(h.doc().status(), ContentStatus::Done);
}

#[test]
fn sync_script_blocks_the_parser() {
    let mut h = Harness::new();
    h.feed(b"<html><head><script src=s.js></script></head><body><p id=after>x</p></body></html>");

    assert_eq!(h.started_urls(), vec!["http://example.test/dir/s.js"]);
    assert_eq!(h.started[0].kind, ResourceKind::Script);
    assert!(h.doc().document().element_by_id("after").is_none());

    h.respond("http://example.test/dir/s.js", "log ran");
    assert!(h.doc().document().element_by_id("after").is_some());

    h.finish();
    assert_eq!(h.doc().status(), ContentStatus::Done);
    assert_eq!(h.engine_log(), vec!["ran", "event:load"]);
}

#[test]
fn end_of_stream_while_blocked_waits_for_the_script() {
    let mut h = Harness::new();
    h.feed(b"<html><body><script src=s.js></script><p id=tail>x</p></body></html>");
    h.finish();
    assert_eq!(h.doc().status(), ContentStatus::Loading);

    h.respond("http://example.test/dir/s.js", "log late");
    assert_eq!(h.doc().status(), ContentStatus::Done);
    assert!(h.doc().id_offset("tail").is_some());
}

#[test]
fn failed_sync_script_unblocks_the_parser() {
    let mut h = Harness::new();
    h.feed(b"<html><body><script src=missing.js></script><p id=tail>x</p></body></html>");
    h.fail_fetch("http://example.test/dir/missing.js");
    assert!(h.doc().document().element_by_id("tail").is_some());
    h.finish();
    assert_eq!(h.doc().status(), ContentStatus::Done);
    assert!(h.doc().scripts().get(0).unwrap().failed);
}

#[test]
fn deferred_scripts_run_once_at_conversion_in_order() {
    let mut h = Harness::new();
    h.load(
        "<html><head><script defer src=a.js></script><script defer src=b.js></script></head>\
         <body><script>log inline</script></body></html>",
    );
    // The parser did not wait for either.
    assert_eq!(h.engine_log(), vec!["inline"]);

    h.respond("http://example.test/dir/b.js", "log b");
    assert_eq!(h.engine_log(), vec!["inline"]);
    h.respond("http://example.test/dir/a.js", "log a");

    assert_eq!(h.engine_log(), vec!["inline", "a", "b", "event:load"]);
    assert_eq!(h.doc().status(), ContentStatus::Done);
    let modes: Vec<ScriptMode> = h.doc().scripts().iter().map(|s| s.mode).collect();
    assert_eq!(modes, vec![ScriptMode::Defer, ScriptMode::Defer, ScriptMode::Inline]);
}

#[test]
fn deferred_script_adding_a_stylesheet_delays_finish() {
    let mut h = Harness::new();
    h.load("<html><head><script defer src=d.js></script></head><body><p id=p>x</p></body></html>");
    h.respond("http://example.test/dir/d.js", "link late.css");

    assert_eq!(h.doc().status(), ContentStatus::Ready);
    assert!(h.doc().box_tree().is_none());
    assert!(h.started_urls().contains(&"http://example.test/dir/late.css"));

    h.respond("http://example.test/dir/late.css", "p { color: red }");

    assert_eq!(h.doc().status(), ContentStatus::Done);
    assert!(h.doc().box_tree().is_some());
    assert_eq!(
        h.statuses(),
        vec![ContentStatus::Loading, ContentStatus::Ready, ContentStatus::Done]
    );
    let loads = h.engine_log().iter().filter(|l| *l == "event:load").count();
    assert_eq!(loads, 1);
}

#[test]
fn load_handler_can_add_stylesheets_after_finish() {
    let mut h = Harness::new();
    h.engine.borrow_mut().on_load = Some("link onload.css".to_string());
    h.load("<html><head></head><body><p>x</p></body></html>");

    assert!(h.doc().box_tree().is_some());
    assert_eq!(h.doc().status(), ContentStatus::Ready);
    h.respond("http://example.test/dir/onload.css", "");
    assert_eq!(h.doc().status(), ContentStatus::Done);
    // User agent, quirks, and the late link; the built tree is not restyled.
    assert_eq!(h.doc().stylesheets().len(), 3);
    assert!(!h.doc().stylesheets().any_modified());
}

#[test]
fn async_script_runs_on_arrival() {
    let mut h = Harness::new();
    h.feed(b"<html><head><script async src=a.js></script></head><body>");
    h.respond("http://example.test/dir/a.js", "log async");
    assert_eq!(h.engine_log(), vec!["async"]);
    h.feed(b"<p>x</p></body></html>");
    h.finish();
    assert_eq!(h.doc().status(), ContentStatus::Done);
}

#[test]
fn script_inserted_scripts_are_fetched_and_run() {
    let mut h = Harness::new();
    h.load("<html><head></head><body><script>script dyn.js</script></body></html>");
    assert_eq!(h.doc().status(), ContentStatus::Loading);
    h.respond("http://example.test/dir/dyn.js", "log dynamic");
    assert_eq!(h.engine_log(), vec!["dynamic", "event:load"]);
    assert_eq!(h.doc().status(), ContentStatus::Done);
}

#[test]
fn scripts_are_skipped_without_scripting() {
    let config = ContentConfig {
        enable_scripting: false,
        ..ContentConfig::default()
    };
    let mut h = Harness::with_config(config, true);
    h.load("<html><body><script src=s.js></script><script>log inline</script></body></html>");
    assert!(h.started.is_empty());
    assert!(h.engine_log().is_empty());
    assert_eq!(h.doc().status(), ContentStatus::Done);
    assert!(!h.doc_mut().exec("log injected"));
}

#[test]
fn scripts_are_skipped_without_an_engine() {
    let mut h = Harness::with_config(ContentConfig::default(), false);
    h.load("<html><body><script src=s.js></script><p id=p>x</p></body></html>");
    assert!(h.started.is_empty());
    assert_eq!(h.doc().status(), ContentStatus::Done);
}

#[test]
fn exec_runs_injected_text_and_detaches_it() {
    let mut h = Harness::new();
    h.load("<html><body><p>x</p></body></html>");
    let dom = h.doc().document();
    let before = dom.elements_named(dom.document(), "script").len();

    assert!(h.doc_mut().exec("log injected"));
    assert!(!h.doc_mut().exec("fail"));

    let dom = h.doc().document();
    assert_eq!(dom.elements_named(dom.document(), "script").len(), before);
    assert_eq!(h.engine_log(), vec!["event:load", "injected"]);
}

#[test]
fn text_edits_reach_form_gadgets() {
    let mut h = Harness::new();
    h.load("<html><body><form><textarea id=t name=t>old</textarea></form></body></html>");
    let value = |h: &Harness| {
        h.doc()
            .box_tree()
            .and_then(|tree| tree.gadgets().first().map(|g| g.value.clone()))
    };
    assert_eq!(value(&h).as_deref(), Some("old"));
    assert!(h.doc_mut().exec("text t new text"));
    assert_eq!(value(&h).as_deref(), Some("new text"));
}

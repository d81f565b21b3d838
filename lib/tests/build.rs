use std::fs;
use std::path::Path;

use glod::{build, Config};

fn site(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["content", "skel", "templates"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
    }

    fs::write(dir.path().join("config.toml"), "title = \"Test Site\"\n").unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    dir
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

#[test]
fn hello_post() {
    let dir = site(&[
        ("content/posts/hello.md", "+++\ntitle = \"Hello\"\ndate = \"2024-03-01\"\n+++\n*hi*\n"),
        ("templates/default.html", "<title>{{ Page.title }} - {{ Site.title }}</title>\n{{ Page.content }}"),
    ]);

    let site = build(&Config::load(dir.path()).unwrap()).unwrap();
    assert_eq!(site.len(), 1);

    let doc = site.get("posts/hello").unwrap();
    assert_eq!(doc.slug(), "hello");
    assert_eq!(doc.path(), "posts");
    assert_eq!(doc.url(), "/posts/hello");
    assert_eq!(doc.title(), "Hello");
    assert_eq!(doc.date(), "2024-03-01");

    let html = read(dir.path(), "www/posts/hello.html");
    assert_eq!(html, "<title>Hello - Test Site</title>\n<p><em>hi</em></p>\n");
}

#[test]
fn index_is_served_at_its_directory() {
    let dir = site(&[
        ("content/index.md", "Welcome."),
        ("content/docs/index.md", ""),
        ("templates/default.html", "{{ Page.title }}"),
    ]);

    let site = build(&Config::load(dir.path()).unwrap()).unwrap();
    assert_eq!(site.get("index").unwrap().url(), "/");
    assert_eq!(site.get("docs/index").unwrap().url(), "/docs/");
    assert_eq!(read(dir.path(), "www/index.html"), "Index");
    assert_eq!(read(dir.path(), "www/docs/index.html"), "Index");
}

#[test]
fn missing_template_stops_the_build() {
    let dir = site(&[
        ("content/a.md", ""),
        ("content/b.md", "+++\ntemplate = \"post\"\n+++\n"),
        ("content/c.md", ""),
        ("templates/default.html", "page"),
    ]);

    let error = build(&Config::load(dir.path()).unwrap()).unwrap_err();
    assert_eq!(error.message(), "build failed");
    assert_eq!(error.context_value("stage").as_deref(), Some("rendering pages"));
    assert_eq!(error.context_value("template").as_deref(), Some("post"));

    let b = dir.path().join("content/b.md");
    assert_eq!(error.context_value("source"), Some(b.display().to_string()));

    let www = dir.path().join("www");
    assert!(www.join("a.html").exists());
    assert!(!www.join("b.html").exists());
    assert!(!www.join("c.html").exists());
}

#[test]
fn duplicate_keys_are_an_error() {
    let dir = site(&[
        ("content/about.html", "<p>one</p>"),
        ("content/about.md", "two"),
        ("templates/default.html", ""),
    ]);

    let error = build(&Config::load(dir.path()).unwrap()).unwrap_err();
    assert_eq!(error.context_value("stage").as_deref(), Some("ingesting content"));
    assert_eq!(error.context_value("key").as_deref(), Some("about"));
    assert!(!dir.path().join("www/about.html").exists());
}

#[test]
fn bad_front_matter_names_the_file() {
    let dir = site(&[
        ("content/broken.md", "+++\ntitle = \n+++\n"),
        ("templates/default.html", ""),
    ]);

    let error = build(&Config::load(dir.path()).unwrap()).unwrap_err();
    let source = dir.path().join("content/broken.md");
    assert_eq!(error.context_value("path"), Some(source.display().to_string()));
}

#[test]
fn full_site() {
    let index = "{% for page in sort(Site.pages, 'title', 'desc') %}{{ page.title }};{% endfor %}";
    let dir = site(&[
        ("skel/css/style.css", "body {}"),
        ("content/index.html", index),
        ("content/posts/one.md", "+++\ntemplate = \"post\"\ntags = [\"a\", \"b\"]\n+++\none"),
        ("content/posts/two.md", "two"),
        ("content/notes.txt", "not content"),
        ("templates/default.html", "{{ Page.content }}"),
        ("templates/post.html", "{{ Page.tags|join(',') }}"),
    ]);

    let site = build(&Config::load(dir.path()).unwrap()).unwrap();
    let keys: Vec<_> = site.documents().iter().map(|doc| doc.key()).collect();
    assert_eq!(keys, ["index", "posts/one", "posts/two"]);

    assert_eq!(read(dir.path(), "www/css/style.css"), "body {}");
    assert_eq!(read(dir.path(), "www/index.html"), "Two;One;Index;");
    assert_eq!(read(dir.path(), "www/posts/one.html"), "a,b");
    assert_eq!(read(dir.path(), "www/posts/two.html"), "<p>two</p>\n");
    assert!(!dir.path().join("www/notes.html").exists());
}

#[test]
fn rebuilding_overwrites_output() {
    let dir = site(&[
        ("content/a.md", "first"),
        ("templates/default.html", "{{ Page.content }}"),
    ]);

    let config = Config::load(dir.path()).unwrap();
    build(&config).unwrap();
    assert_eq!(read(dir.path(), "www/a.html"), "<p>first</p>\n");

    fs::write(dir.path().join("content/a.md"), "second").unwrap();
    build(&config).unwrap();
    assert_eq!(read(dir.path(), "www/a.html"), "<p>second</p>\n");
}

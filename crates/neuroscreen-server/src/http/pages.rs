//! Static HTML pages.

use axum::response::Html;

/// A page served verbatim at a fixed path.
pub struct Page {
    pub path: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

const NAV: &str = r#"<nav><a href="/index">Home</a> | <a href="/autism">Autism screen</a> | <a href="/adhd">ADHD questionnaire</a> | <a href="/about">About</a> | <a href="/resources">Resources</a> | <a href="/faq">FAQ</a></nav>"#;

pub const PAGES: &[Page] = &[
    Page {
        path: "/",
        title: "NeuroScreen",
        body: r#"<h1>NeuroScreen</h1>
<p>Early screening support for autism and ADHD. NeuroScreen is not a diagnostic tool.</p>
<p><a href="/signin">Sign in</a> or <a href="/signup">create an account</a>.</p>"#,
    },
    Page {
        path: "/signin",
        title: "Sign in",
        body: r#"<h1>Sign in</h1>
<form method="post" action="/login">
<label>Email <input type="email" name="email"></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Sign in</button>
</form>"#,
    },
    Page {
        path: "/signup",
        title: "Sign up",
        body: r#"<h1>Create an account</h1>
<form method="post" action="/register">
<label>Name <input type="text" name="name"></label>
<label>Email <input type="email" name="email"></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Sign up</button>
</form>"#,
    },
    Page {
        path: "/index",
        title: "Dashboard",
        body: r#"<h1>Choose a screening</h1>
<ul>
<li><a href="/autism">Autism and emotion screen from a photo</a></li>
<li><a href="/adhd">ADHD questionnaire</a></li>
<li><a href="/realtime_autism">Real-time autism screen</a></li>
<li><a href="/realtime_adhd">Real-time ADHD screen</a></li>
</ul>"#,
    },
    Page {
        path: "/autism",
        title: "Autism screen",
        body: r#"<h1>Autism screen</h1>
<form method="post" action="/autism_result" enctype="multipart/form-data">
<input type="file" name="image" accept=".png,.jpg,.jpeg">
<button type="submit">Analyze</button>
</form>"#,
    },
    Page {
        path: "/adhd",
        title: "ADHD questionnaire",
        body: r#"<h1>ADHD questionnaire</h1>
<p>Answer 15 questions from 0 (never) to 4 (very often). Answers are scored by <code>POST /adhd_score</code>.</p>
<form method="get" action="/adhd_result_local">
<label>Total score <input type="number" name="score" min="0" max="60"></label>
<label>Inattention <input type="number" name="inattention" min="0"></label>
<label>Hyperactivity <input type="number" name="hyperactivity" min="0"></label>
<label>Impulsivity <input type="number" name="impulsivity" min="0"></label>
<button type="submit">See result</button>
</form>"#,
    },
    Page {
        path: "/realtime_adhd",
        title: "Real-time ADHD screen",
        body: "<h1>Real-time ADHD screen</h1>\n<p>Allow camera access to begin.</p>\n<video autoplay playsinline></video>",
    },
    Page {
        path: "/realtime_autism",
        title: "Real-time autism screen",
        body: "<h1>Real-time autism screen</h1>\n<p>Allow camera access to begin.</p>\n<video autoplay playsinline></video>",
    },
    Page {
        path: "/about",
        title: "About",
        body: "<h1>About NeuroScreen</h1>\n<p>NeuroScreen combines an image classifier, facial emotion recognition and a self-report questionnaire to suggest when a professional evaluation may help.</p>",
    },
    Page {
        path: "/resources",
        title: "Resources",
        body: "<h1>Resources</h1>\n<p>Talk to a paediatrician, psychologist or psychiatrist about any concern raised here.</p>",
    },
    Page {
        path: "/faq",
        title: "FAQ",
        body: "<h1>Frequently asked questions</h1>\n<h2>Is this a diagnosis?</h2>\n<p>No. Results are a screening aid only.</p>\n<h2>Are my photos kept?</h2>\n<p>Uploads are stored on the server under a random name.</p>",
    },
];

/// Wraps a page body in the shared document shell.
#[must_use]
pub fn render(page: &Page) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{NAV}\n{}\n</body>\n</html>\n",
        page.title, page.body
    ))
}

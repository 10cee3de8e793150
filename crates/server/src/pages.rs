//! HTML index page rendering

use catalog::FileEntry;

/// Render the file listing as a plain HTML page with download links
pub fn render_index(files: &[FileEntry]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Media Library</title>\n\
         <style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\
         td,th{padding:0.4em 1em;border-bottom:1px solid #ccc;text-align:left}</style>\n\
         </head>\n<body>\n<h1>Media Library</h1>\n",
    );

    if files.is_empty() {
        html.push_str("<p>No files found.</p>\n");
    } else {
        html.push_str(
            "<table>\n<tr><th>Name</th><th>Category</th><th>Size (MB)</th><th></th></tr>\n",
        );
        for file in files {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>\
                 <td><a href=\"/download{}\">Download</a></td></tr>\n",
                escape_html(&file.name),
                escape_html(&file.category),
                file.size_mb,
                file.path.display(),
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

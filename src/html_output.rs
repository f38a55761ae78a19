//! Static HTML documentation site.
//!
//! One `index.html` listing the resources, a `programmersinfo.html` page on the
//! documentation decorators, one page per resource named after its binary name and
//! one page per data shape named after the type it describes. Pages link to each
//! other with relative `./<name>.html` hrefs, so the directory can be browsed as is.

use crate::classfile::descriptor::{is_core_type, TypeRef};
use crate::model::{BindingKind, DataShape, Endpoint, Resource, RestApiModel};
use crate::serializer::write_to_file;
use crate::source_scanner::doc_comment::clean_doc_text;
use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

pub const INDEX_PAGE: &str = "index.html";
pub const PROGRAMMERS_INFO_PAGE: &str = "programmersinfo.html";

const STYLE: &str = "table, th, td { border: 1px solid #D6D6C2; border-collapse: collapse; }\n\
                     th, td { padding: 8px; }\n\
                     .nav td { border: none; }";

/// One rendered page of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    pub file_name: String,
    pub content: String,
}

/// Escape text for element content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page_name(type_name: &str) -> String {
    format!("{}.html", type_name)
}

fn link(type_name: &str) -> String {
    format!(
        "<a href=\"./{}\">{}</a>",
        escape_html(&page_name(type_name)),
        escape_html(type_name)
    )
}

/// Renders a [`RestApiModel`] as a set of linked HTML pages.
pub struct HtmlRenderer<'a> {
    title: &'a str,
    model: &'a RestApiModel,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(title: &'a str, model: &'a RestApiModel) -> Self {
        Self { title, model }
    }

    /// Render every page of the site. Resources without endpoints get no page.
    pub fn render(&self) -> Vec<HtmlPage> {
        let mut pages = vec![
            HtmlPage {
                file_name: INDEX_PAGE.to_string(),
                content: self.index_page(),
            },
            HtmlPage {
                file_name: PROGRAMMERS_INFO_PAGE.to_string(),
                content: programmers_info_page(),
            },
        ];

        for resource in self.documented_resources() {
            debug!("Rendering resource page for {}", resource.qualified_name);
            pages.push(HtmlPage {
                file_name: page_name(&resource.qualified_name),
                content: self.resource_page(resource),
            });
        }

        for (type_name, shape) in &self.model.data_shapes {
            debug!("Rendering data shape page for {}", type_name);
            pages.push(HtmlPage {
                file_name: page_name(type_name),
                content: data_shape_page(type_name, shape),
            });
        }

        pages
    }

    fn documented_resources(&self) -> Vec<&'a Resource> {
        let mut resources: Vec<&Resource> = self
            .model
            .resources
            .iter()
            .filter(|r| !r.endpoints.is_empty())
            .collect();
        resources.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        resources
    }

    fn index_page(&self) -> String {
        let mut body = format!(
            "<h1 id=\"top\">REST API for project: &quot;{}&quot;</h1>\n<ul>\n",
            escape_html(self.title)
        );
        for resource in self.documented_resources() {
            body.push_str(&format!(
                "<li><a href=\"./{}\">{}</a> {}</li>\n",
                escape_html(&page_name(&resource.qualified_name)),
                escape_html(&resource.display_name),
                escape_html(&resource.root_path)
            ));
        }
        body.push_str("</ul>\n");
        body.push_str(&format!(
            "<p><a href=\"./{}\"><h4>Programmers Information</h4></a></p>\n",
            PROGRAMMERS_INFO_PAGE
        ));
        document(&body)
    }

    fn resource_page(&self, resource: &Resource) -> String {
        let mut endpoints: Vec<&Endpoint> = resource.endpoints.iter().collect();
        endpoints.sort_by(|a, b| {
            (a.http_method.as_str(), &a.path).cmp(&(b.http_method.as_str(), &b.path))
        });

        let mut body = format!(
            "<h1 id=\"top\">{}</h1>\n{}<p>{}</p>\n<ul>\n",
            escape_html(&resource.display_name),
            home_link(),
            escape_html(&resource.root_path)
        );
        for (i, endpoint) in endpoints.iter().enumerate() {
            body.push_str(&format!(
                "<li><a href=\"#method{}\">{} {}</a></li>\n",
                i + 1,
                endpoint.http_method.as_str(),
                escape_html(&display_path(&endpoint.path))
            ));
        }
        body.push_str("</ul>\n");

        for (i, endpoint) in endpoints.iter().enumerate() {
            body.push_str(&self.endpoint_section(endpoint, i + 1));
        }
        document(&body)
    }

    fn endpoint_section(&self, endpoint: &Endpoint, number: usize) -> String {
        let mut out = format!(
            "<h3 id=\"method{}\">{} {}{}</h3>\n<table>\n",
            number,
            endpoint.http_method.as_str(),
            escape_html(&display_path(&endpoint.path)),
            if endpoint.deprecated { " - Deprecated" } else { "" }
        );

        if let Some(doc) = &endpoint.doc {
            let text = clean_doc_text(doc);
            if !text.is_empty() {
                let lines: Vec<String> = text.lines().map(escape_html).collect();
                out.push_str(&format!(
                    "<tr><td colspan=\"3\">{}</td></tr>\n",
                    lines.join("<br>")
                ));
            }
        }

        out.push_str("<tr><th>Name</th><th>Class</th><th>Parameter type</th></tr>\n");
        for parameter in &endpoint.parameters {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&parameter.name),
                self.type_cell(&parameter.type_name),
                binding_label(parameter.kind)
            ));
        }
        out.push_str("</table>\n");

        let returned = endpoint
            .return_info
            .annotated_type
            .as_deref()
            .unwrap_or(&endpoint.return_info.type_name);
        let media = if endpoint.produces.is_empty() {
            "-".to_string()
        } else {
            escape_html(&endpoint.produces.join(", "))
        };
        out.push_str("<p>JAX-RS Response</p>\n<table>\n");
        out.push_str("<tr><th>Element</th><th>Media Type</th><th>Default Status Code</th></tr>\n");
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{} {}</td></tr>\n</table>\n",
            self.type_cell(returned),
            media,
            endpoint.return_info.status_code,
            escape_html(&endpoint.return_info.status_text)
        ));
        out
    }

    /// A type name with the described types linked to their pages.
    fn type_cell(&self, type_name: &str) -> String {
        let shapes = &self.model.data_shapes;
        let Ok(type_ref) = type_name.parse::<TypeRef>() else {
            return escape_html(type_name);
        };
        if shapes.contains_key(&type_ref.name) {
            return link_array(&type_ref);
        }
        match type_ref.element_type() {
            Some(element) if type_ref.is_collection() && shapes.contains_key(&element.name) => {
                format!(
                    "{}&lt;{}&gt;",
                    escape_html(&type_ref.name),
                    link_array(&element)
                )
            }
            _ => escape_html(type_name),
        }
    }
}

fn link_array(type_ref: &TypeRef) -> String {
    let mut out = link(&type_ref.name);
    for _ in 0..type_ref.array_dims {
        out.push_str("[]");
    }
    out
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "\"\""
    } else {
        path
    }
}

fn binding_label(kind: BindingKind) -> &'static str {
    match kind {
        BindingKind::Path => "Path parameter",
        BindingKind::Header => "Header parameter",
        BindingKind::Query => "Query parameter",
        BindingKind::Body => "Request body",
    }
}

fn data_shape_page(type_name: &str, shape: &DataShape) -> String {
    let mut body = format!(
        "<h1 id=\"top\">{}</h1>\n{}<table>\n",
        escape_html(type_name),
        home_link()
    );
    if let Some(description) = &shape.description {
        body.push_str(&format!(
            "<tr><td colspan=\"3\">{}</td></tr>\n",
            escape_html(description)
        ));
    }
    body.push_str("<tr><th>Field name</th><th>Field type</th><th>Type in list</th></tr>\n");
    for field in &shape.fields {
        let element = match field.element_type.as_deref() {
            Some(element) if !is_core_type(element) => link(element),
            Some(element) => escape_html(element),
            None => "-".to_string(),
        };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&field.name),
            escape_html(&field.type_name),
            element
        ));
    }
    body.push_str("</table>\n");
    document(&body)
}

fn programmers_info_page() -> String {
    let examples: BTreeMap<&str, (&str, &str)> = BTreeMap::from([
        (
            "DocReturnType",
            (
                "Documents a return type other than the declared one.",
                "@POST\n@Path(PATH_VALIDATE)\n@DocReturnType(key = \"com.acme.PaymentValidation\")\n\
                 public Response validatePayment() {\n    return Response.ok(validation).build();\n}",
            ),
        ),
        (
            "DocListType",
            (
                "Names the element type of a collection getter.",
                "@DocListType(key = \"com.acme.Movie\")\npublic List<Movie> getMovies() {\n    return movies;\n}",
            ),
        ),
    ]);

    let mut body = format!("<h1 id=\"top\">Programmers Info</h1>\n{}<table>\n", home_link());
    body.push_str("<tr><th>Annotation</th><th>Comment</th></tr>\n");
    for (annotation, (comment, example)) in examples {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n<tr><td colspan=\"2\"><pre>{}</pre></td></tr>\n",
            annotation,
            escape_html(comment),
            escape_html(example)
        ));
    }
    body.push_str("</table>\n");
    document(&body)
}

fn home_link() -> String {
    format!(
        "<table class=\"nav\"><tr><td><a href=\"./{}\"><h4>Home</h4></a></td></tr></table>\n",
        INDEX_PAGE
    )
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>REST documentation</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\
         <table class=\"nav\"><tr><td><a href=\"#top\"><h4>To top</h4></a></td>\
         <td><a href=\"./{}\"><h4>Home</h4></a></td></tr></table>\n</body>\n</html>\n",
        STYLE, body, INDEX_PAGE
    )
}

/// Write every page into `output_dir`, replacing files of the same name.
pub fn write_site(pages: &[HtmlPage], output_dir: &Path) -> Result<()> {
    for page in pages {
        write_to_file(&page.content, &output_dir.join(&page.file_name))?;
    }
    info!("Wrote {} HTML page(s) to {}", pages.len(), output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, HttpMethod, Parameter, RequestBody, ReturnInfo};
    use std::fs;
    use tempfile::TempDir;

    fn endpoint(method: HttpMethod, path: &str, return_type: &str) -> Endpoint {
        Endpoint {
            method_name: "handle".to_string(),
            http_method: method,
            path: path.to_string(),
            produces: vec!["application/json".to_string()],
            consumes: vec![],
            parameters: vec![],
            return_info: ReturnInfo {
                type_name: return_type.to_string(),
                annotated_type: None,
                status_code: 200,
                status_text: "OK".to_string(),
            },
            doc: None,
            deprecated: false,
            request_body: None,
        }
    }

    fn create_test_model() -> RestApiModel {
        let mut find = endpoint(HttpMethod::Get, "/{id}", "com.acme.User");
        find.doc = Some("\r* Finds one <user>.\r* @param id the user id\r".to_string());
        find.parameters.push(Parameter {
            kind: BindingKind::Path,
            name: "id".to_string(),
            type_name: "long".to_string(),
        });

        let mut create = endpoint(HttpMethod::Post, "", "void");
        create.deprecated = true;
        create.parameters.push(Parameter {
            kind: BindingKind::Body,
            name: "First argument".to_string(),
            type_name: "com.acme.User".to_string(),
        });
        create.request_body = Some(RequestBody {
            name: "First argument".to_string(),
            type_name: "com.acme.User".to_string(),
        });

        let mut model = RestApiModel::default();
        model.resources.push(Resource {
            qualified_name: "com.acme.UserResource".to_string(),
            display_name: "UserResource".to_string(),
            class_path: "/users".to_string(),
            root_path: "/api/users".to_string(),
            endpoints: vec![
                create,
                endpoint(HttpMethod::Get, "", "java.util.List<com.acme.User>"),
                find,
            ],
        });
        model.resources.push(Resource {
            qualified_name: "com.acme.BaseResource".to_string(),
            display_name: "BaseResource".to_string(),
            class_path: "/api".to_string(),
            root_path: "/api".to_string(),
            endpoints: vec![],
        });
        model.data_shapes.insert(
            "com.acme.User".to_string(),
            DataShape::with_fields(vec![
                Field {
                    name: "name".to_string(),
                    type_name: "java.lang.String".to_string(),
                    element_type: None,
                },
                Field {
                    name: "roles".to_string(),
                    type_name: "java.util.List".to_string(),
                    element_type: Some("com.acme.Role".to_string()),
                },
            ]),
        );
        model
            .data_shapes
            .insert("com.acme.Role".to_string(), DataShape::enumeration("ADMIN, MEMBER"));
        model
    }

    fn page<'a>(pages: &'a [HtmlPage], file_name: &str) -> &'a str {
        &pages
            .iter()
            .find(|p| p.file_name == file_name)
            .unwrap_or_else(|| panic!("missing page {}", file_name))
            .content
    }

    #[test]
    fn test_site_has_one_page_per_resource_and_shape() {
        let model = create_test_model();
        let pages = HtmlRenderer::new("Acme", &model).render();

        let names: Vec<&str> = pages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "index.html",
                "programmersinfo.html",
                "com.acme.UserResource.html",
                "com.acme.Role.html",
                "com.acme.User.html",
            ]
        );
    }

    #[test]
    fn test_index_lists_documented_resources() {
        let model = create_test_model();
        let pages = HtmlRenderer::new("Acme & Co", &model).render();
        let index = page(&pages, INDEX_PAGE);

        assert!(index.contains("REST API for project: &quot;Acme &amp; Co&quot;"));
        assert!(index.contains("<a href=\"./com.acme.UserResource.html\">UserResource</a> /api/users"));
        assert!(!index.contains("BaseResource"));
        assert!(index.contains("./programmersinfo.html"));
    }

    #[test]
    fn test_resource_page_orders_and_links_endpoints() {
        let model = create_test_model();
        let pages = HtmlRenderer::new("Acme", &model).render();
        let resource = page(&pages, "com.acme.UserResource.html");

        let get_list = resource.find("<a href=\"#method1\">GET &quot;&quot;</a>").unwrap();
        let get_one = resource.find("<a href=\"#method2\">GET /{id}</a>").unwrap();
        let post = resource.find("<a href=\"#method3\">POST &quot;&quot;</a>").unwrap();
        assert!(get_list < get_one && get_one < post);

        assert!(resource.contains("java.util.List&lt;<a href=\"./com.acme.User.html\">com.acme.User</a>&gt;"));
        assert!(resource.contains("Finds one &lt;user&gt;.<br>@param id the user id"));
        assert!(resource.contains("<td>id</td><td>long</td><td>Path parameter</td>"));
        assert!(resource.contains("POST &quot;&quot; - Deprecated</h3>"));
        assert!(resource.contains("<td>Request body</td>"));
        assert!(resource.contains("<td>200 OK</td>"));
    }

    #[test]
    fn test_data_shape_pages() {
        let model = create_test_model();
        let pages = HtmlRenderer::new("Acme", &model).render();

        let user = page(&pages, "com.acme.User.html");
        assert!(user.contains("<td>name</td><td>java.lang.String</td><td>-</td>"));
        assert!(user.contains("<td>roles</td><td>java.util.List</td><td><a href=\"./com.acme.Role.html\">com.acme.Role</a></td>"));

        let role = page(&pages, "com.acme.Role.html");
        assert!(role.contains("enum ADMIN, MEMBER"));
    }

    #[test]
    fn test_write_site() {
        let model = create_test_model();
        let pages = HtmlRenderer::new("Acme", &model).render();
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("site");

        write_site(&pages, &out).unwrap();

        let index = fs::read_to_string(out.join(INDEX_PAGE)).unwrap();
        assert!(index.starts_with("<!DOCTYPE html>"));
        assert!(out.join("com.acme.User.html").is_file());
        assert_eq!(fs::read_dir(&out).unwrap().count(), pages.len());
    }
}

use axum::response::Html;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>User API</title>
  </head>
  <body>
    <h1>User API</h1>
    <h2>Routes</h2>
    <ul>
      <li><strong>GET /user</strong>: list all users</li>
      <li><strong>GET /user/:id</strong>: fetch one user by id</li>
      <li><strong>POST /user</strong>: create a user</li>
      <li><strong>PUT /user/:id</strong>: update a user by id</li>
      <li><strong>POST /login</strong>: log in and receive a session token</li>
      <li><strong>GET /protected</strong>: requires a session token in the Authorization header</li>
    </ul>
  </body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

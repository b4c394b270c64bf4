//! Pre-built endpoint schemas for tests.
//!
//! # Example
//!
//! ```
//! use accord_test::fixtures;
//!
//! let endpoints = fixtures::user_service_endpoints();
//! assert!(endpoints.get("getUser").is_some());
//! ```

use accord_core::{EndpointMap, EndpointSchema, Shape, StatusCode};

/// Creates the endpoint map of a small user service.
///
/// - `getUser` - GET /users/:userId
/// - `listUsers` - GET /users?page=&pageSize=
/// - `createUser` - POST /users
/// - `updateUser` - PUT /users/:userId
/// - `deleteUser` - DELETE /users/:userId
///
/// # Panics
///
/// Panics if a fixture schema fails to build.
#[must_use]
pub fn user_service_endpoints() -> EndpointMap {
    EndpointMap::new()
        .endpoint(
            "getUser",
            EndpointSchema::get("/users/:userId")
                .params(user_id_params())
                .returns(StatusCode::Ok, user_shape())
                .returns(StatusCode::NotFound, error_shape())
                .describe("Retrieves a user by ID")
                .build()
                .expect("getUser schema is valid"),
        )
        .endpoint(
            "listUsers",
            EndpointSchema::get("/users")
                .optional_query(Shape::object(vec![
                    ("page", Shape::integer().minimum(1)),
                    ("pageSize", Shape::integer().minimum(1).maximum(100)),
                ]))
                .returns(
                    StatusCode::Ok,
                    Shape::object(vec![
                        ("users", Shape::array(user_shape()).required()),
                        ("total", Shape::integer().required()),
                    ]),
                )
                .describe("Lists users with pagination")
                .build()
                .expect("listUsers schema is valid"),
        )
        .endpoint(
            "createUser",
            EndpointSchema::post("/users")
                .body(create_user_shape())
                .returns(StatusCode::Created, user_shape())
                .returns(StatusCode::BadRequest, error_shape())
                .describe("Creates a new user")
                .build()
                .expect("createUser schema is valid"),
        )
        .endpoint(
            "updateUser",
            EndpointSchema::put("/users/:userId")
                .params(user_id_params())
                .body(create_user_shape())
                .returns(StatusCode::Ok, user_shape())
                .returns(StatusCode::NotFound, error_shape())
                .describe("Updates an existing user")
                .build()
                .expect("updateUser schema is valid"),
        )
        .endpoint(
            "deleteUser",
            EndpointSchema::delete("/users/:userId")
                .params(user_id_params())
                .no_content(StatusCode::NoContent)
                .returns(StatusCode::NotFound, error_shape())
                .describe("Deletes a user")
                .build()
                .expect("deleteUser schema is valid"),
        )
}

/// A user as returned by the service.
#[must_use]
pub fn user_shape() -> Shape {
    Shape::object(vec![
        ("id", Shape::string().required()),
        ("name", Shape::string().required()),
        ("email", Shape::string()),
    ])
}

/// The body accepted by `createUser` and `updateUser`.
#[must_use]
pub fn create_user_shape() -> Shape {
    Shape::object(vec![
        ("name", Shape::string().min_length(1).required()),
        ("email", Shape::string()),
    ])
}

/// `{ "userId": string }` path parameters.
#[must_use]
pub fn user_id_params() -> Shape {
    Shape::object(vec![("userId", Shape::string().min_length(1).required())])
}

/// The service's error payload.
#[must_use]
pub fn error_shape() -> Shape {
    Shape::object(vec![
        ("code", Shape::string().required()),
        ("message", Shape::string()),
    ])
}

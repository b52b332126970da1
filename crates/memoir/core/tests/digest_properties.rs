// Memoir
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Digest properties: value-equal trees share a store directory, value
//! differences move elsewhere, and the digest never depends on the order
//! configuration keys arrive in.

use memoir_core::params::{ParamDigest, ParamSchema, ParamTree, overlay};
use proptest::prelude::*;
use serde_json::json;

fn schema() -> ParamSchema {
    let grid = ParamSchema::builder("Grid").param("nx", 16).param("ny", 16).build().unwrap();
    ParamSchema::builder("Sim")
        .param("steps", 100)
        .param("dt", 0.01)
        .param("tag", "base")
        .child("grid", grid)
        .build()
        .unwrap()
}

fn resolve(steps: i64, dt: f64, tag: &str, nx: i64) -> ParamTree {
    overlay::resolve(
        &schema(),
        &json!({
            "steps": steps,
            "dt": dt,
            "tag": tag,
            "grid": {"nx": nx},
        }),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn equal_trees_share_a_digest(
        steps in 0i64..10_000,
        dt in 1e-6f64..10.0,
        tag in "[a-z]{0,8}",
        nx in 1i64..512,
    ) {
        let a = resolve(steps, dt, &tag, nx);
        let b = resolve(steps, dt, &tag, nx);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            ParamDigest::of_tree(&a).unwrap(),
            ParamDigest::of_tree(&b).unwrap()
        );
    }

    #[test]
    fn any_leaf_difference_changes_the_digest(
        steps in 0i64..10_000,
        dt in 1e-6f64..10.0,
        tag in "[a-z]{0,8}",
        nx in 1i64..512,
    ) {
        let base = resolve(steps, dt, &tag, nx);
        let digest = ParamDigest::of_tree(&base).unwrap();

        let perturbed = [
            resolve(steps + 1, dt, &tag, nx),
            resolve(steps, dt * 2.0, &tag, nx),
            resolve(steps, dt, &format!("{}x", tag), nx),
            resolve(steps, dt, &tag, nx + 1),
        ];
        for tree in &perturbed {
            prop_assert_ne!(&digest, &ParamDigest::of_tree(tree).unwrap());
        }
    }

    #[test]
    fn digest_ignores_configuration_key_order(
        steps in 0i64..10_000,
        nx in 1i64..512,
    ) {
        let forward = overlay::resolve(&schema(), &json!({"steps": steps, "grid": {"nx": nx}})).unwrap();
        let backward = overlay::resolve(&schema(), &json!({"grid": {"nx": nx}, "steps": steps})).unwrap();
        prop_assert_eq!(
            ParamDigest::of_tree(&forward).unwrap(),
            ParamDigest::of_tree(&backward).unwrap()
        );
    }
}

#[test]
fn digest_is_deterministic_lowercase_hex() {
    let tree = overlay::resolve(&schema(), &json!({})).unwrap();
    let digest = ParamDigest::of_tree(&tree).unwrap();
    let again = ParamDigest::of_tree(&tree).unwrap();
    assert_eq!(digest, again);
    assert_eq!(digest.as_str().len(), 64);
    assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

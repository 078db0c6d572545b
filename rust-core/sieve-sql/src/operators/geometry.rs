// SPDX-License-Identifier: PMPL-1.0-or-later
//! PostGIS spatial predicates.
//!
//! Condition geometries are GeoJSON (an object or its text) in SRID 4326.
//! Distances are measured in SRID 3857 units.

use sieve_core::operators as names;
use sieve_core::{QueryError, Value};

use crate::operator::{invalid, required, PlanContext, SqlOperator};
use crate::predicate::{CompareOp, Expr, Predicate};
use crate::statement::FieldRef;

const WGS84: &str = "4326";
const WEB_MERCATOR: &str = "3857";

fn geojson_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_json().to_string(),
    }
}

/// `ST_SetSRID(ST_GeomFromGeoJSON($n), 4326)`.
fn geometry_param(value: &Value) -> Expr {
    Expr::call(
        "ST_SetSRID",
        vec![
            Expr::call("ST_GeomFromGeoJSON", vec![Expr::param(geojson_text(value))]),
            Expr::raw(WGS84),
        ],
    )
}

fn transform(expr: Expr, srid: &str) -> Expr {
    Expr::call("ST_Transform", vec![expr, Expr::raw(srid)])
}

/// Binary topological predicates, e.g. `ST_Intersects(column, geometry)`.
pub struct Spatial {
    name: &'static str,
    function: &'static str,
}

impl Spatial {
    pub const ALL: [Spatial; 8] = [
        Spatial { name: names::INTERSECTS, function: "ST_Intersects" },
        Spatial { name: names::WITHIN, function: "ST_Within" },
        Spatial { name: names::CONTAINS_GEOM, function: "ST_Contains" },
        Spatial { name: names::TOUCHES, function: "ST_Touches" },
        Spatial { name: names::CROSSES, function: "ST_Crosses" },
        Spatial { name: names::OVERLAPS, function: "ST_Overlaps" },
        Spatial { name: names::DISJOINT, function: "ST_Disjoint" },
        Spatial { name: names::GEOM_EQUALS, function: "ST_Equals" },
    ];
}

impl SqlOperator for Spatial {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let geometry = geometry_param(required(value, self.name)?);
        Ok(Predicate::Function(Expr::call(
            self.function,
            vec![transform(field.to_expr(self.name)?, WGS84), geometry],
        )))
    }
}

/// `dwithin` and `distance_lt`, both taking `[geometry, distance]`.
pub struct Distance {
    name: &'static str,
    strict_less: bool,
}

impl Distance {
    pub const DWITHIN: Distance = Distance { name: names::DWITHIN, strict_less: false };
    pub const DISTANCE_LT: Distance = Distance { name: names::DISTANCE_LT, strict_less: true };
}

impl SqlOperator for Distance {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let (geometry, distance) = match required(value, self.name)?.as_list() {
            Some([geometry, distance]) => match distance.as_f64() {
                Some(d) => (geometry, d),
                None => return Err(invalid(self.name, "distance must be a number")),
            },
            _ => {
                return Err(invalid(
                    self.name,
                    format!("{} requires [GeoJSON, distance_meters]", self.name),
                ))
            }
        };

        let column = transform(field.to_expr(self.name)?, WEB_MERCATOR);
        let target = transform(geometry_param(geometry), WEB_MERCATOR);
        Ok(if self.strict_less {
            Predicate::compare(
                Expr::call("ST_Distance", vec![column, target]),
                CompareOp::Lt,
                Expr::param(distance),
            )
        } else {
            Predicate::Function(Expr::call(
                "ST_DWithin",
                vec![column, target, Expr::param(distance)],
            ))
        })
    }
}

/// `bbox_intersects [min_x, min_y, max_x, max_y]` via the `&&&` operator.
pub struct BboxIntersects;

impl SqlOperator for BboxIntersects {
    fn name(&self) -> &str {
        names::BBOX_INTERSECTS
    }

    fn compile(
        &self,
        field: &FieldRef,
        value: Option<&Value>,
        _: Option<&str>,
        _: &PlanContext<'_>,
    ) -> Result<Predicate, QueryError> {
        let corners: Option<Vec<f64>> = required(value, names::BBOX_INTERSECTS)?
            .as_list()
            .filter(|items| items.len() == 4)
            .and_then(|items| items.iter().map(Value::as_f64).collect());
        let Some(corners) = corners else {
            return Err(invalid(
                names::BBOX_INTERSECTS,
                "bbox_intersects requires [minX, minY, maxX, maxY]",
            ));
        };

        let mut args: Vec<Expr> = corners.into_iter().map(Expr::param).collect();
        args.push(Expr::raw(WGS84));
        Ok(Predicate::Binary {
            left: field.to_expr(names::BBOX_INTERSECTS)?,
            op: "&&&".to_string(),
            right: Expr::call("ST_MakeEnvelope", args),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_predicate, PlaceholderStyle};
    use crate::schema::{Entity, Schema};
    use crate::statement::{ColumnRef, Statement};
    use serde_json::json;

    fn compile(op: &dyn SqlOperator, value: Value) -> Result<String, QueryError> {
        let root = Entity::new("Site", "sites");
        let schema = Schema::new().with(root.clone());
        let statement = Statement::select(&root);
        let ctx = PlanContext { schema: &schema, root: &root, statement: &statement };
        let field = FieldRef::Column(ColumnRef::new("sites", "geom"));
        op.compile(&field, Some(&value), None, &ctx)
            .map(|p| render_predicate(&p, PlaceholderStyle::Dollar).sql)
    }

    #[test]
    fn test_intersects() {
        let [intersects, ..] = Spatial::ALL;
        let point = Value::from(json!({"type": "Point", "coordinates": [4.9, 52.3]}));
        assert_eq!(
            compile(&intersects, point).unwrap(),
            "ST_Intersects(ST_Transform(\"sites\".\"geom\", 4326), ST_SetSRID(ST_GeomFromGeoJSON($1), 4326))"
        );
    }

    #[test]
    fn test_distance_requires_pair() {
        let point = json!({"type": "Point", "coordinates": [0, 0]});
        let sql = compile(&Distance::DISTANCE_LT, Value::from(json!([point.clone(), 500]))).unwrap();
        assert!(sql.starts_with("ST_Distance(ST_Transform(\"sites\".\"geom\", 3857)"));
        assert!(sql.ends_with("< $2"));

        assert!(matches!(
            compile(&Distance::DWITHIN, Value::from(point)),
            Err(QueryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_bbox_requires_four_numbers() {
        let sql = compile(&BboxIntersects, Value::from(vec![0.0, 0.0, 1.0, 1.0])).unwrap();
        assert_eq!(sql, "\"sites\".\"geom\" &&& ST_MakeEnvelope($1, $2, $3, $4, 4326)");
        assert!(compile(&BboxIntersects, Value::from(vec![0.0, 1.0])).is_err());
    }
}

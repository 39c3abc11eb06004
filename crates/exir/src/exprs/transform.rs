use std::rc::Rc;

use crate::error::Error;
use crate::expr::Expr;
use crate::ir::{Args, Ir};
use crate::schema::{Kind, OutputType, Schema};
use crate::value::{RotateOrder, TypeRef, Value};

use super::CoreIr;
use super::math::MathKinds;

/// Handles to the rotation and transform kinds.
#[derive(Debug, Clone)]
pub struct TransformKinds {
    pub rotation: Kind,
    pub rotation_identity: Kind,
    pub euler_rotation: Kind,

    pub transform: Kind,
    pub transform_identity: Kind,
    pub compose_transform: Kind,
    pub local_to_world: Kind,
    pub world_to_local: Kind,
    pub transform_from_matrix: Kind,
    pub matrix_from_transform: Kind,

    // Shared output kinds of the abstract transform: handlers registered
    // on these cover every concrete subtype's specialization.
    pub translation_output: Kind,
    pub rotation_output: Kind,
    pub scale_output: Kind,
}

impl TransformKinds {
    pub(crate) fn register(ir: &mut Ir, math: &MathKinds) -> Result<Self, Error> {
        let schema = &mut ir.schema;
        let scalar_t = TypeRef::Kind(math.scalar.clone());

        let rotation = Schema::declare("Rotation")
            .abstract_kind()
            .extends(&math.expression)
            .register(schema)?;
        let rotation_identity = Schema::declare("RotationIdentity")
            .extends(&rotation)
            .register(schema)?;
        let euler_rotation = Schema::declare("EulerRotation")
            .extends(&rotation)
            .field("x", scalar_t.clone())
            .field("y", scalar_t.clone())
            .field("z", scalar_t.clone())
            .field_with_default("order", TypeRef::RotateOrder, RotateOrder::Xyz)
            .register(schema)?;

        let transform = Schema::declare("Transform")
            .abstract_kind()
            .extends(&math.expression)
            .output("translation", OutputType::Kind(math.vector.clone()))
            .output("rotation", OutputType::Kind(rotation.clone()))
            .output("scale", OutputType::Kind(math.vector.clone()))
            .register(schema)?;
        let transform_t = TypeRef::Kind(transform.clone());

        let translation_output = schema.output_kind(&transform, "translation")?;
        let rotation_output = schema.output_kind(&transform, "rotation")?;
        let scale_output = schema.output_kind(&transform, "scale")?;

        let transform_identity = Schema::declare("TransformIdentity")
            .extends(&transform)
            .register(schema)?;

        let zero_vector = ir.build(&math.vector_constant, Args::new())?;
        let ones_vector = ir.build_positional(&math.vector_constant, [1.0, 1.0, 1.0])?;
        let identity_rotation = ir.build(&rotation_identity, Args::new())?;

        let schema = &mut ir.schema;
        let compose_transform = Schema::declare("ComposeTransform")
            .extends(&transform)
            .field_with_default("translation", TypeRef::Kind(math.vector.clone()), &zero_vector)
            .field_with_default("rotation", TypeRef::Kind(rotation.clone()), &identity_rotation)
            .field_with_default("scale", TypeRef::Kind(math.vector.clone()), &ones_vector)
            .register(schema)?;
        let local_to_world = Schema::declare("LocalToWorldTransform")
            .extends(&transform)
            .field("parent", transform_t.clone())
            .field("transform", transform_t.clone())
            .register(schema)?;
        let world_to_local = Schema::declare("WorldToLocalTransform")
            .extends(&transform)
            .field("parent", transform_t.clone())
            .field("transform", transform_t.clone())
            .register(schema)?;
        let transform_from_matrix = Schema::declare("TransformFromMatrix")
            .extends(&transform)
            .field("value", TypeRef::Kind(math.matrix.clone()))
            .register(schema)?;
        let matrix_from_transform = Schema::declare("MatrixFromTransform")
            .extends(&math.matrix)
            .field("value", transform_t.clone())
            .register(schema)?;

        ir.register_conversion(
            TypeRef::Kind(transform_from_matrix.clone()),
            TypeRef::Kind(math.matrix.clone()),
            crate::conversions::constructor(&transform_from_matrix),
        );
        ir.register_conversion(
            TypeRef::Kind(matrix_from_transform.clone()),
            TypeRef::Kind(transform.clone()),
            crate::conversions::constructor(&matrix_from_transform),
        );

        // A vector of angles in degrees reads as an Euler rotation.
        let angles = euler_rotation.clone();
        let component = math.vector_component.clone();
        ir.register_conversion(
            TypeRef::Kind(euler_rotation.clone()),
            TypeRef::Kind(math.vector.clone()),
            Rc::new(move |ir, value| {
                let components = (0..3i64)
                    .map(|index| {
                        ir.build(&component, Args::new().arg(value.clone()).arg(index))
                            .map(Value::Node)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ir.build_positional(&angles, components).map(Value::Node)
            }),
        );

        Ok(TransformKinds {
            rotation,
            rotation_identity,
            euler_rotation,
            transform,
            transform_identity,
            compose_transform,
            local_to_world,
            world_to_local,
            transform_from_matrix,
            matrix_from_transform,
            translation_output,
            rotation_output,
            scale_output,
        })
    }
}

impl CoreIr {
    /// An Euler rotation in degrees with the default XYZ order.
    pub fn euler(&self, x: f64, y: f64, z: f64) -> Result<Expr, Error> {
        self.build_positional(&self.transform.euler_rotation, [x, y, z])
    }

    pub fn euler_with_order(
        &self,
        x: f64,
        y: f64,
        z: f64,
        order: RotateOrder,
    ) -> Result<Expr, Error> {
        self.build(
            &self.transform.euler_rotation,
            Args::new().arg(x).arg(y).arg(z).arg(order),
        )
    }

    pub fn rotation_identity(&self) -> Result<Expr, Error> {
        self.build(&self.transform.rotation_identity, Args::new())
    }

    pub fn transform_identity(&self) -> Result<Expr, Error> {
        self.build(&self.transform.transform_identity, Args::new())
    }

    /// A transform composed from translation, rotation, and scale parts;
    /// omitted parts default to identity.
    pub fn compose(&self, args: Args) -> Result<Expr, Error> {
        self.build(&self.transform.compose_transform, args)
    }

    pub fn local_to_world(&self, parent: &Expr, transform: &Expr) -> Result<Expr, Error> {
        self.binary(&self.transform.local_to_world, parent, transform)
    }

    pub fn world_to_local(&self, parent: &Expr, transform: &Expr) -> Result<Expr, Error> {
        self.binary(&self.transform.world_to_local, parent, transform)
    }

    pub fn transform_from_matrix(&self, matrix: &Expr) -> Result<Expr, Error> {
        self.unary(&self.transform.transform_from_matrix, matrix)
    }

    pub fn matrix_from_transform(&self, transform: &Expr) -> Result<Expr, Error> {
        self.unary(&self.transform.matrix_from_transform, transform)
    }

    pub fn translation(&self, transform: &Expr) -> Result<Expr, Error> {
        self.output(transform, "translation")
    }

    pub fn rotation(&self, transform: &Expr) -> Result<Expr, Error> {
        self.output(transform, "rotation")
    }

    pub fn scale(&self, transform: &Expr) -> Result<Expr, Error> {
        self.output(transform, "scale")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_defaults_to_identity_parts() {
        let core = CoreIr::new().unwrap();
        let t = core.compose(Args::new()).unwrap();

        assert_eq!(
            t.node_field("translation").unwrap().kind(),
            &core.math.vector_constant
        );
        assert_eq!(
            t.node_field("rotation").unwrap().kind(),
            &core.transform.rotation_identity
        );
        assert_eq!(
            t.node_field("scale").unwrap().field("xvalue"),
            Some(&Value::from(1.0))
        );
    }

    #[test]
    fn test_output_accessor_kinds_specialize_per_subtype() {
        let core = CoreIr::new().unwrap();
        let identity = core.transform_identity().unwrap();
        let composed = core.compose(Args::new()).unwrap();

        let a = core.translation(&identity).unwrap();
        assert_ne!(a.kind(), &core.transform.translation_output);
        assert!(a.is_a(&core.transform.translation_output));
        assert!(a.is_a(&core.math.vector));

        // The field on a composed transform shadows the output accessor.
        let b = core.translation(&composed).unwrap();
        assert_eq!(b.kind(), &core.math.vector_constant);
    }

    #[test]
    fn test_euler_order_defaults_to_xyz() {
        let core = CoreIr::new().unwrap();
        let rotation = core.euler(10.0, 20.0, 30.0).unwrap();
        assert_eq!(
            rotation.field("order"),
            Some(&Value::RotateOrder(RotateOrder::Xyz))
        );
    }

    #[test]
    fn test_matrix_converts_to_transform() {
        let core = CoreIr::new().unwrap();
        let m = core.identity_matrix().unwrap();
        let t = core
            .ir()
            .convert_to_node(&core.transform.transform, Value::from(&m))
            .unwrap();
        assert_eq!(t.kind(), &core.transform.transform_from_matrix);
    }

    #[test]
    fn test_vector_converts_to_euler_rotation() {
        let core = CoreIr::new().unwrap();
        let v = core.vector(90.0, 0.0, 0.0).unwrap();
        let r = core
            .ir()
            .convert_to_node(&core.transform.rotation, Value::from(&v))
            .unwrap();
        assert_eq!(r.kind(), &core.transform.euler_rotation);
        assert_eq!(
            r.node_field("x").unwrap().kind(),
            &core.math.vector_component
        );
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene flattening: instance references resolved into world-space nodes.
//!
//! A depth-first walk over the document's object list expands every instance
//! reference into the leaf renderables of its definition, composing placement
//! transforms on the way down. The walk runs on an explicit worklist, and an
//! active-definition stack rejects instance cycles per subtree instead of
//! recursing forever.

use crate::error::{Error, Result};
use nalgebra::Matrix4;
use smallvec::SmallVec;
use urbanstl_scene::{
    DefinitionId, LayerId, ObjectId, PropertyMap, Renderable, SceneDocument, SceneObject,
};

/// One piece of renderable geometry after flattening. Immutable afterward.
#[derive(Debug, Clone)]
pub struct GeometryNode {
    /// Originating top-level object, used for grouping and metadata lookup
    pub source: ObjectId,
    /// Layer driving classification (member overrides applied)
    pub layer: LayerId,
    /// Leaf renderable; never an instance reference
    pub renderable: Renderable,
    /// World transform accumulated from all enclosing placements
    pub transform: Matrix4<f64>,
    /// Object-level properties merged over layer-level ones
    pub properties: PropertyMap,
}

/// Result of flattening a document
#[derive(Debug, Default)]
pub struct FlattenOutcome {
    pub nodes: Vec<GeometryNode>,
    /// Subtrees abandoned because their definition referenced itself
    pub cyclic_rejections: usize,
}

type ActiveStack = SmallVec<[DefinitionId; 8]>;

struct WorkItem<'a> {
    renderable: &'a Renderable,
    transform: Matrix4<f64>,
    layer: LayerId,
    properties: PropertyMap,
    active: ActiveStack,
}

/// Flatten a document into world-space geometry nodes.
///
/// The source document is never mutated. Nodes come out in depth-first
/// document order, so the result is reproducible for identical input.
pub fn flatten_document(doc: &SceneDocument) -> Result<FlattenOutcome> {
    let root = if doc.unit_scale != 1.0 {
        Matrix4::new_scaling(doc.unit_scale)
    } else {
        Matrix4::identity()
    };

    let mut outcome = FlattenOutcome::default();
    for object in doc.objects() {
        flatten_object(doc, object, &root, &mut outcome)?;
    }
    Ok(outcome)
}

fn flatten_object(
    doc: &SceneDocument,
    object: &SceneObject,
    root: &Matrix4<f64>,
    outcome: &mut FlattenOutcome,
) -> Result<()> {
    let layer_properties = doc
        .layers
        .get(object.layer)
        .map(|l| l.properties.clone())
        .unwrap_or_default();
    let properties = object.properties.merged_over(&layer_properties);

    let mut stack: Vec<WorkItem> = vec![WorkItem {
        renderable: &object.renderable,
        transform: *root,
        layer: object.layer,
        properties,
        active: ActiveStack::new(),
    }];

    while let Some(item) = stack.pop() {
        let instance = match item.renderable {
            Renderable::Instance(instance) => instance,
            leaf => {
                outcome.nodes.push(GeometryNode {
                    source: object.id,
                    layer: item.layer,
                    renderable: leaf.clone(),
                    transform: item.transform,
                    properties: item.properties.clone(),
                });
                continue;
            }
        };

        match expand_instance(doc, instance.definition, &item.active) {
            Ok(active) => {
                let definition = doc.definitions.get(instance.definition)?;
                let placed = item.transform * instance.transform;
                // Reverse push keeps member order depth-first
                for member in definition.members.iter().rev() {
                    stack.push(WorkItem {
                        renderable: &member.renderable,
                        transform: placed * member.transform,
                        layer: member.layer.unwrap_or(item.layer),
                        properties: item.properties.merged_over(&member.properties),
                        active: active.clone(),
                    });
                }
            }
            Err(Error::CyclicInstance(_)) => {
                // Abandon just this subtree; the rest of the walk continues
                outcome.cyclic_rejections += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn expand_instance(
    doc: &SceneDocument,
    definition: DefinitionId,
    active: &ActiveStack,
) -> Result<ActiveStack> {
    if active.contains(&definition) {
        return Err(Error::CyclicInstance(definition));
    }
    doc.definitions.get(definition)?;
    let mut next = active.clone();
    next.push(definition);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use urbanstl_scene::{InstanceMember, InstanceRef, MeshData};

    fn unit_box() -> Renderable {
        Renderable::Mesh(MeshData::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ))
    }

    #[test]
    fn test_leaf_objects_pass_through() {
        let mut doc = SceneDocument::new();
        let layer = doc.layers.add("Buildings", None).unwrap();
        doc.add_object("box", layer, unit_box()).unwrap();

        let outcome = flatten_document(&doc).unwrap();
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.cyclic_rejections, 0);
        assert_eq!(outcome.nodes[0].transform, Matrix4::identity());
    }

    #[test]
    fn test_nested_instances_compose_transforms() {
        let mut doc = SceneDocument::new();
        let layer = doc.layers.add("Trees", None).unwrap();

        let t_inner = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0));
        let t_outer = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let t_member = Matrix4::from_axis_angle(&Vector3::z_axis(), 0.25);

        let leaf_def = doc.add_definition(
            "leaf",
            vec![InstanceMember::new(unit_box()).with_transform(t_member)],
        );
        let nested_def = doc.add_definition(
            "nested",
            vec![InstanceMember::new(Renderable::Instance(InstanceRef {
                definition: leaf_def,
                transform: t_inner,
            }))],
        );
        doc.add_object(
            "instance",
            layer,
            Renderable::Instance(InstanceRef {
                definition: nested_def,
                transform: t_outer,
            }),
        )
        .unwrap();

        let outcome = flatten_document(&doc).unwrap();
        assert_eq!(outcome.nodes.len(), 1);

        // Flattening must equal applying the single composed transform
        let expected = t_outer * t_inner * t_member;
        let got = outcome.nodes[0].transform;
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(got[(i, j)], expected[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_cycle_rejected_without_aborting_walk() {
        let mut doc = SceneDocument::new();
        let layer = doc.layers.add("Buildings", None).unwrap();

        // First definition added gets id 0, so it can reference itself
        let self_id = DefinitionId(0);
        let created = doc.add_definition(
            "cyclic",
            vec![
                InstanceMember::new(Renderable::Instance(InstanceRef {
                    definition: self_id,
                    transform: Matrix4::identity(),
                })),
                InstanceMember::new(unit_box()),
            ],
        );
        assert_eq!(created, self_id);

        doc.add_object(
            "looper",
            layer,
            Renderable::Instance(InstanceRef {
                definition: self_id,
                transform: Matrix4::identity(),
            }),
        )
        .unwrap();
        doc.add_object("plain", layer, unit_box()).unwrap();

        let outcome = flatten_document(&doc).unwrap();
        // The self reference is dropped; the definition's leaf member and the
        // plain object both survive.
        assert_eq!(outcome.cyclic_rejections, 1);
        assert_eq!(outcome.nodes.len(), 2);
    }

    #[test]
    fn test_member_layer_override_wins() {
        let mut doc = SceneDocument::new();
        let buildings = doc.layers.add("Buildings", None).unwrap();
        let trees = doc.layers.add("Trees", None).unwrap();

        let def = doc.add_definition(
            "mixed",
            vec![
                InstanceMember::new(unit_box()),
                InstanceMember::new(unit_box()).with_layer(trees),
            ],
        );
        doc.add_object(
            "instance",
            buildings,
            Renderable::Instance(InstanceRef {
                definition: def,
                transform: Matrix4::identity(),
            }),
        )
        .unwrap();

        let outcome = flatten_document(&doc).unwrap();
        assert_eq!(outcome.nodes.len(), 2);
        assert_eq!(outcome.nodes[0].layer, buildings);
        assert_eq!(outcome.nodes[1].layer, trees);
    }

    #[test]
    fn test_unit_scale_scales_geometry() {
        let mut doc = SceneDocument::with_unit_scale(0.001); // millimeters
        let layer = doc.layers.add("Grounds", None).unwrap();
        doc.add_object("slab", layer, unit_box()).unwrap();

        let outcome = flatten_document(&doc).unwrap();
        let p = outcome.nodes[0]
            .transform
            .transform_point(&Point3::new(1000.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
    }
}

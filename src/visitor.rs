use crate::ir::{BindDocument, ComponentNode, ElementNode, ExpressionNode, TemplateNode, TextNode};

/// Single traversal mechanism for bind documents.
///
/// Implementers override `visit_*` to add behavior and call the matching
/// `walk_*` to keep descending. Children are visited in document order.
pub trait TemplateVisitor {
    fn visit_document(&mut self, document: &mut BindDocument) {
        walk_document(self, document);
    }

    fn visit_node(&mut self, node: &mut TemplateNode) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &mut ElementNode) {
        walk_element(self, element);
    }

    fn visit_component(&mut self, component: &mut ComponentNode) {
        walk_component(self, component);
    }

    fn visit_text(&mut self, _text: &mut TextNode) {}

    fn visit_expression(&mut self, _expression: &mut ExpressionNode) {}

    fn visit_children(&mut self, children: &mut Vec<TemplateNode>) {
        walk_children(self, children);
    }
}

pub fn walk_document<V: TemplateVisitor + ?Sized>(visitor: &mut V, document: &mut BindDocument) {
    visitor.visit_children(&mut document.nodes);
}

pub fn walk_children<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    children: &mut Vec<TemplateNode>,
) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: TemplateVisitor + ?Sized>(visitor: &mut V, node: &mut TemplateNode) {
    match node {
        TemplateNode::Element(el) => visitor.visit_element(el),
        TemplateNode::Component(c) => visitor.visit_component(c),
        TemplateNode::Text(t) => visitor.visit_text(t),
        TemplateNode::Expression(e) => visitor.visit_expression(e),
    }
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(visitor: &mut V, element: &mut ElementNode) {
    visitor.visit_children(&mut element.children);
}

pub fn walk_component<V: TemplateVisitor + ?Sized>(visitor: &mut V, component: &mut ComponentNode) {
    visitor.visit_children(&mut component.children);
}

/// Angular error codes reported by template type-checking. Numeric values are stable and
/// surface to users as `NG<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// An element name failed validation against the DOM schema.
    SchemaInvalidElement = 8001,

    /// An element's attribute name failed validation against the DOM schema.
    SchemaInvalidAttribute = 8002,

    /// No matching directive was found for a `#ref="target"` expression.
    MissingReferenceTarget = 8003,

    /// No matching pipe was found for a `| name` usage in a template.
    MissingPipe = 8004,

    /// The left-hand side of an assignment expression was a template variable. Effectively, the
    /// template looked like:
    ///
    /// ```text
    /// <ng-template let-something>
    ///   <button (click)="something = ...">...</button>
    /// </ng-template>
    /// ```
    ///
    /// Template variables are read-only.
    WriteToReadOnlyVariable = 8005,

    /// A template variable was declared twice. For example:
    ///
    /// ```text
    /// <div *ngFor="let i of items; let i = index">
    /// </div>
    /// ```
    DuplicateVariableDeclaration = 8006,

    /// A template has a two way binding (two bindings created by a single syntactical element)
    /// in which the input and output are going to different places.
    SplitTwoWayBinding = 8007,

    /// A directive usage isn't binding to one or more required inputs.
    MissingRequiredInputs = 8008,

    /// A two way binding in a template has an incorrect syntax,
    /// parentheses outside brackets. For example:
    ///
    /// ```text
    /// <div ([foo])="bar" />
    /// ```
    InvalidBananaInBox = 8101,

    /// The left side of a nullish coalescing operation is not nullable.
    ///
    /// ```text
    /// {{ foo ?? bar }}
    /// ```
    /// When the type of foo doesn't include `null` or `undefined`.
    NullishCoalescingNotNullable = 8102,

    /// The template type-checking engine would need to generate an inline type check block for a
    /// component, but the current type-checking environment doesn't support it.
    InlineTcbRequired = 8900,

    /// The template type-checking engine would need to generate an inline type constructor for a
    /// directive or component, but the current type-checking environment doesn't support it.
    InlineTypeCtorRequired = 8901,
}

//! HTTP status to NestJS exception and swagger decorator.

use crate::syntax::printer::DecoratorSpec;

/// `(status, exception, swagger response decorator)`.
const STATUS_TABLE: &[(&str, &str, &str)] = &[
    ("400", "BadRequestException", "ApiBadRequestResponse"),
    ("401", "UnauthorizedException", "ApiUnauthorizedResponse"),
    ("403", "ForbiddenException", "ApiForbiddenResponse"),
    ("404", "NotFoundException", "ApiNotFoundResponse"),
    ("409", "ConflictException", "ApiConflictResponse"),
    ("410", "GoneException", "ApiGoneResponse"),
    ("422", "UnprocessableEntityException", "ApiUnprocessableEntityResponse"),
    ("500", "InternalServerErrorException", "ApiInternalServerErrorResponse"),
    ("502", "BadGatewayException", "ApiBadGatewayResponse"),
    ("503", "ServiceUnavailableException", "ApiServiceUnavailableResponse"),
];

const GENERIC_EXCEPTION: &str = "HttpException";
const GENERIC_RESPONSE_DECORATOR: &str = "ApiResponse";

/// Exception kind for one error status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorKind {
    pub status: String,
    pub exception: &'static str,
    /// Absent for statuses outside the table.
    mapped_decorator: Option<&'static str>,
}

impl ErrorKind {
    pub fn for_status(status: &str) -> Self {
        match STATUS_TABLE.iter().find(|(code, _, _)| *code == status) {
            Some(&(_, exception, decorator)) => Self {
                status: status.to_string(),
                exception,
                mapped_decorator: Some(decorator),
            },
            None => Self {
                status: status.to_string(),
                exception: GENERIC_EXCEPTION,
                mapped_decorator: None,
            },
        }
    }

    pub fn is_generic(&self) -> bool {
        self.mapped_decorator.is_none()
    }

    /// `throw new NotFoundException(payload)` or
    /// `throw new HttpException(payload, 418)`.
    pub fn throw_statement(&self, payload: &str) -> String {
        if self.is_generic() {
            format!("throw new {}({payload}, {})", self.exception, self.status)
        } else {
            format!("throw new {}({payload})", self.exception)
        }
    }

    pub fn decorator_name(&self) -> &'static str {
        self.mapped_decorator.unwrap_or(GENERIC_RESPONSE_DECORATOR)
    }

    /// `@ApiNotFoundResponse()` or `@ApiResponse({ status: 418 })`.
    pub fn decorator(&self) -> DecoratorSpec {
        match self.mapped_decorator {
            Some(name) => DecoratorSpec::bare(name),
            None => DecoratorSpec::new(
                GENERIC_RESPONSE_DECORATOR,
                vec![format!("{{ status: {} }}", self.status)],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_status() {
        let kind = ErrorKind::for_status("404");
        assert_eq!(kind.exception, "NotFoundException");
        assert_eq!(
            kind.throw_statement("{ message: 'x' }"),
            "throw new NotFoundException({ message: 'x' })"
        );
        assert_eq!(kind.decorator().render(), "@ApiNotFoundResponse()");
    }

    #[test]
    fn unmapped_status_falls_back() {
        let kind = ErrorKind::for_status("418");
        assert!(kind.is_generic());
        assert_eq!(kind.throw_statement("err"), "throw new HttpException(err, 418)");
        assert_eq!(kind.decorator().render(), "@ApiResponse({ status: 418 })");
        assert_eq!(kind.decorator_name(), "ApiResponse");
    }

    #[test]
    fn every_table_entry_has_matching_names() {
        for (code, exception, decorator) in STATUS_TABLE {
            let kind = ErrorKind::for_status(code);
            assert_eq!(kind.exception, *exception);
            assert_eq!(kind.decorator_name(), *decorator);
            let stem = exception.trim_end_matches("Exception");
            assert_eq!(*decorator, format!("Api{stem}Response"));
        }
    }
}
